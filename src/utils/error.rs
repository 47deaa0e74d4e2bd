//! The `error` module defines the error types used within `psbroker`.
//!
//! `BrokerError` covers failures of the server process itself and knows the
//! exit code each one maps to. `ProtocolError` describes why a client command
//! line was rejected; it never leaves the connection handler, where it is
//! answered with `:invalid`.

use std::io;

use config::ConfigError;
use thiserror::Error;

/// Exit status for command-line usage and configuration errors.
pub const EXIT_USAGE: i32 = 1;
/// Exit status when the listening socket cannot be opened.
pub const EXIT_BIND: i32 = 2;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Usage: psserver connections [portnum]")]
    Usage,

    #[error("psserver: invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("psserver: unable to open socket for listening")]
    Bind(#[source] io::Error),

    #[error("admission pool closed")]
    AdmissionClosed,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BrokerError {
    /// The process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BrokerError::Bind(_) => EXIT_BIND,
            BrokerError::Usage
            | BrokerError::Config(_)
            | BrokerError::AdmissionClosed
            | BrokerError::Io(_) => EXIT_USAGE,
        }
    }
}

/// Reasons a command line is answered with `:invalid`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("wrong number of fields for `{0}`")]
    WrongFieldCount(String),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("invalid token `{0}`")]
    InvalidToken(String),

    #[error("empty value")]
    EmptyValue,
}
