//! Controller session backed by TCP connections to every computation server.

use std::{io, time::Duration};

use bytes::Bytes;
use futures::{SinkExt, StreamExt, future};
use log::{debug, info, warn};
use tokio::{io::AsyncWriteExt, net::TcpStream, runtime::Runtime};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::Controller;
use crate::config::{ControllerConfiguration, ServerConfiguration};
use crate::error::{ControllerError, ErrorRecord, WorkerError, WorkerFailure};
use crate::value::ValueMap;
use crate::wire::{
    RunCodeReply, RunCodeRequest, decode_frame, encode_frame, frame_codec, from_wire_values,
    to_wire_values,
};

/// Length-framed connection to one server.
type Connection = Framed<TcpStream, LengthDelimitedCodec>;

/// An open connection to one computation server.
struct Worker {
    name: String,
    conn: Connection,
}

impl Worker {
    /// Send an encoded request and wait for the server's reply.
    async fn run(&mut self, request: Bytes) -> Result<ValueMap, ErrorRecord> {
        self.conn
            .send(request)
            .await
            .map_err(|e| self.failure("failed to send request", &e))?;
        let frame = match self.conn.next().await {
            Some(frame) => frame.map_err(|e| self.failure("failed to receive reply", &e))?,
            None => {
                return Err(ErrorRecord::new(format!(
                    "server '{}' closed the connection before replying",
                    self.name
                )));
            }
        };
        let reply: RunCodeReply =
            decode_frame(&frame).map_err(|e| self.failure("failed to decode reply", &e))?;

        match reply {
            RunCodeReply::Results(values) => {
                from_wire_values(values).map_err(|e| self.failure("invalid result value", &e))
            }
            RunCodeReply::Failure(messages) => Err(ErrorRecord::from_messages(messages)
                .unwrap_or_else(|| {
                    ErrorRecord::new(format!(
                        "server '{}' reported a failure without a message",
                        self.name
                    ))
                })),
        }
    }

    fn failure(&self, what: &str, err: &(dyn std::error::Error + 'static)) -> ErrorRecord {
        ErrorRecord::new(format!("{what} from server '{}'", self.name))
            .caused_by(ErrorRecord::from_error(err))
    }
}

/// Open a connection, bounded by `timeout` when one is configured.
async fn connect_worker(
    server: &ServerConfiguration,
    timeout: Option<Duration>,
) -> Result<Worker, ControllerError> {
    let connect = TcpStream::connect(server.address.as_str());
    let stream = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, connect)
            .await
            .unwrap_or_else(|_| {
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "connection attempt timed out",
                ))
            }),
        None => connect.await,
    }
    .map_err(|source| ControllerError::Connect {
        server: server.name.clone(),
        address: server.address.clone(),
        source,
    })?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle on '{}': {e}", server.name);
    }
    info!(
        "Connected to server '{}' at {}",
        server.name, server.address
    );
    Ok(Worker {
        name: server.name.clone(),
        conn: Framed::new(stream, frame_codec()),
    })
}

/// Session with the computation servers of one configuration.
///
/// This is a reference transport. Argument bytes are sent to every server
/// exactly as the client encoded them, in the clear; no secret sharing takes
/// place here. Connections are opened by [`SystemController::connect`] and
/// shut down when the controller is dropped.
pub struct SystemController {
    runtime: Runtime,
    workers: Vec<Worker>,
}

impl SystemController {
    /// Connect to every configured server. Workers keep the configuration order.
    pub fn connect(config: &ControllerConfiguration) -> Result<Self, ControllerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ControllerError::Runtime)?;
        let timeout = config.connect_timeout();
        let workers = runtime.block_on(future::try_join_all(
            config
                .servers
                .iter()
                .map(|server| connect_worker(server, timeout)),
        ))?;
        Ok(Self { runtime, workers })
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for SystemController {
    fn drop(&mut self) {
        let workers = std::mem::take(&mut self.workers);
        self.runtime.block_on(async {
            for mut worker in workers {
                match worker.conn.get_mut().shutdown().await {
                    Ok(()) => debug!("Disconnected from server '{}'", worker.name),
                    // the peer may already have closed the connection
                    Err(e) => debug!("Closing connection to server '{}': {e}", worker.name),
                }
            }
        });
    }
}

impl Controller for SystemController {
    fn run_code(
        &mut self,
        program: &str,
        arguments: &ValueMap,
    ) -> Result<ValueMap, ControllerError> {
        let request = Bytes::from(encode_frame(&RunCodeRequest {
            program: program.to_string(),
            arguments: to_wire_values(arguments),
        })?);
        debug!(
            "Submitting program '{program}' with {} arguments to {} workers",
            arguments.len(),
            self.workers.len()
        );

        let outcomes = self.runtime.block_on(future::join_all(
            self.workers
                .iter_mut()
                .map(|worker| worker.run(request.clone())),
        ));

        let num_workers = outcomes.len();
        let mut results = Vec::with_capacity(num_workers);
        let mut failures = Vec::new();
        for (worker, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(values) => results.push(values),
                Err(error) => {
                    warn!("Worker {worker} failed to run program '{program}': {error}");
                    failures.push(WorkerFailure { worker, error });
                }
            }
        }
        if !failures.is_empty() {
            return Err(WorkerError {
                num_workers,
                failures,
            }
            .into());
        }

        let mut results = results.into_iter();
        let Some(first) = results.next() else {
            return Ok(ValueMap::new());
        };
        if results.any(|values| values != first) {
            return Err(ControllerError::InconsistentResults {
                program: program.to_string(),
            });
        }
        debug!("Program '{program}' returned {} results", first.len());
        Ok(first)
    }
}
