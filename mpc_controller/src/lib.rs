//! Controller contract for running programs on MPC computation servers.
//!
//! A client hands a [`ValueMap`] of named, typed, protection-domain tagged
//! arguments to a [`Controller`] together with the name of a precompiled
//! program. The controller submits the job to every computation server and
//! returns the named results. How the servers evaluate the program among
//! themselves is not visible at this layer.
//!
//! [`SystemController`] is a reference transport: it sends every argument's
//! bytes as they are, without splitting them into secret shares.
//!
//! # Wire Format
//!
//! [`SystemController`] exchanges length-prefixed frames with each server:
//!
//! ```text
//! [LEN: 4 bytes big-endian u32][MAGIC: 4 bytes][VERSION: 4 bytes big-endian u32][PAYLOAD: msgpack bytes]
//! ```
//!
//! - **LEN**: Size of the frame that follows (magic, version and payload)
//! - **MAGIC**: Frame type identifier ("MPCQ" for requests, "MPCR" for replies)
//! - **VERSION**: Protocol version as big-endian u32 (fixed 4 bytes)
//! - **PAYLOAD**: MessagePack-serialized data
//!
//! # Versioning Policy
//!
//! Only an exact version match is accepted. A server speaking another
//! version is reported as a failure of that worker rather than guessed at.

mod config;
mod error;
mod system;
mod types;
mod value;
mod wire;

pub use config::{ControllerConfiguration, ServerConfiguration};
pub use error::{
    ConfigError, ControllerError, DecodeError, EncodeError, ErrorRecord, InvalidValue, ParseError,
    WorkerError, WorkerFailure,
};
pub use system::SystemController;
pub use types::{InvalidScalarType, Scalar, ScalarType};
pub use value::{Value, ValueMap};
pub use wire::{
    Frame, RunCodeReply, RunCodeRequest, WireValue, decode_frame, encode_frame, frame_codec,
};

/// Current protocol version for run-code requests.
pub const REQUEST_VERSION: u32 = 1;

/// Current protocol version for run-code replies.
pub const REPLY_VERSION: u32 = 1;

/// Magic bytes identifying run-code requests: "MPCQ" in ASCII.
pub const REQUEST_MAGIC: [u8; 4] = *b"MPCQ";

/// Magic bytes identifying run-code replies: "MPCR" in ASCII.
pub const REPLY_MAGIC: [u8; 4] = *b"MPCR";

/// Header size: 4 bytes magic + 4 bytes version.
pub const HEADER_SIZE: usize = 8;

/// Largest frame accepted from the network (64 MiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Remote execution entry point.
///
/// Implementations block until every worker has answered or failed.
pub trait Controller {
    /// Run the precompiled `program` with `arguments` and return its named results.
    fn run_code(&mut self, program: &str, arguments: &ValueMap)
    -> Result<ValueMap, ControllerError>;
}
