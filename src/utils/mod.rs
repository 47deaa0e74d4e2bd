//! The `utils` module provides the error types and logging setup shared
//! across the `psbroker` crate and its binaries.

pub mod error;
pub mod logging;

pub use error::{BrokerError, ProtocolError};
