//! Error types for the controller, its configuration and the wire format.

use std::{error::Error as StdError, fmt, io, path::PathBuf};

use crate::types::ScalarType;

/// Error type for decoding a request or reply frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame ends before its magic and version fields.
    #[error("frame of {0} bytes is too short to hold a header")]
    Truncated(usize),
    /// The frame is tagged as another kind of message.
    #[error("frame tagged {found:?}, expected {expected:?}")]
    WrongMagic { expected: [u8; 4], found: [u8; 4] },
    #[error("unsupported protocol version {got}, expected {expected}")]
    UnsupportedVersion { got: u32, expected: u32 },
    #[error("malformed frame payload")]
    Payload(#[source] rmp_serde::decode::Error),
}

/// Error type for encoding a request or reply frame.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode frame payload")]
pub struct EncodeError(#[source] pub(crate) rmp_serde::encode::Error);

/// A byte buffer does not fit the declared scalar type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{len} bytes is not a whole number of '{scalar_type}' elements of {width} bytes")]
pub struct InvalidValue {
    pub scalar_type: ScalarType,
    pub width: usize,
    pub len: usize,
}

/// Error type for decoding a [`crate::Value`] into plain Rust values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The value carries a type tag the controller does not know.
    #[error("unknown type '{0}'")]
    UnknownType(String),
    /// The value's type tag differs from the requested type.
    #[error("expected type '{expected}', got '{got}'")]
    TypeMismatch { expected: ScalarType, got: String },
    /// The value does not hold the number of bytes the request needs.
    #[error("expected {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },
}

/// Error type for loading a controller configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration file '{}' lists no servers", path.display())]
    NoServers { path: PathBuf },
    #[error("configuration file '{}' lists server '{name}' more than once", path.display())]
    DuplicateServer { path: PathBuf, name: String },
}

/// A single failure, optionally linked to the failure that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub message: String,
    pub cause: Option<Box<ErrorRecord>>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn caused_by(mut self, cause: ErrorRecord) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Build a chain from messages ordered outermost first.
    ///
    /// Returns `None` for an empty list.
    pub fn from_messages<I>(messages: I) -> Option<Self>
    where
        I: IntoIterator,
        I::IntoIter: DoubleEndedIterator,
        I::Item: Into<String>,
    {
        messages.into_iter().rev().fold(None, |cause, message| {
            let record = ErrorRecord::new(message);
            Some(match cause {
                Some(cause) => record.caused_by(cause),
                None => record,
            })
        })
    }

    /// Capture an error and every error reachable through its `source()` links.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut messages = vec![err.to_string()];
        let mut source = err.source();
        while let Some(err) = source {
            messages.push(err.to_string());
            source = err.source();
        }
        // `messages` holds at least the outermost error
        Self::from_messages(messages).unwrap_or_else(|| ErrorRecord::new(err.to_string()))
    }

    /// Iterate over this record and its causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ErrorRecord> {
        std::iter::successors(Some(self), |record| record.cause.as_deref())
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Failure reported for one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    /// Index of the worker in the configured server list.
    pub worker: usize,
    pub error: ErrorRecord,
}

/// One or more computation workers failed to run a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} of {num_workers} workers failed", failures.len())]
pub struct WorkerError {
    pub num_workers: usize,
    pub failures: Vec<WorkerFailure>,
}

/// Error type for [`crate::Controller`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to server '{server}' at {address}")]
    Connect {
        server: String,
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to start the controller runtime")]
    Runtime(#[source] io::Error),
    #[error("failed to encode run-code request")]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Workers(#[from] WorkerError),
    #[error("workers returned different results for program '{program}'")]
    InconsistentResults { program: String },
}
