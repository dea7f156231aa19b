//! Unified error type for the zmk-connector-lib crate.
//!
//! [`ConnectorError`] wraps module-specific errors (`TransportError`,
//! `DecodeError`, `EncodingError`) and adds the argument, config and JSON
//! failures seen at the command surface. `From` impls allow `?` to propagate
//! across module boundaries.

use std::fmt;

use crate::report::DecodeError;
use crate::text::EncodingError;
use crate::transport::TransportError;

/// Process exit status for each error family.
pub mod exit_code {
    /// `EIO`: enumeration, open or report exchange failed.
    pub const IO: i32 = 5;
    /// `EINVAL`: bad command-line arguments.
    pub const INVALID_ARGUMENT: i32 = 22;
    /// `EPROTO`: the device answered with a malformed report.
    pub const PROTOCOL: i32 = 71;
    /// `EILSEQ`: a string could not be converted.
    pub const ENCODING: i32 = 84;
    /// Anything else (config, JSON).
    pub const OTHER: i32 = 1;
}

/// Unified error type for zmk-connector-lib operations.
#[derive(Debug)]
pub enum ConnectorError {
    /// Enumeration, open or feature report exchange failed.
    Transport(TransportError),
    /// Response buffer did not match the report layout.
    Malformed(DecodeError),
    /// Device or caller string could not be converted.
    Encoding(EncodingError),
    /// Caller supplied unusable arguments; no device was touched.
    InvalidArgument(String),
    /// Configuration validation error.
    Config(String),
    /// Result could not be serialized.
    Json(serde_json::Error),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
}

impl ConnectorError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ConnectorError::Transport(_) | ConnectorError::Io(_) => exit_code::IO,
            ConnectorError::Malformed(_) => exit_code::PROTOCOL,
            ConnectorError::Encoding(_) => exit_code::ENCODING,
            ConnectorError::InvalidArgument(_) => exit_code::INVALID_ARGUMENT,
            ConnectorError::Config(_) | ConnectorError::Json(_) => exit_code::OTHER,
        }
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorError::Transport(e) => write!(f, "{e}"),
            ConnectorError::Malformed(e) => write!(f, "Malformed report: {e}"),
            ConnectorError::Encoding(e) => write!(f, "Encoding error: {e}"),
            ConnectorError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            ConnectorError::Config(e) => write!(f, "Config error: {e}"),
            ConnectorError::Json(e) => write!(f, "JSON error: {e}"),
            ConnectorError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ConnectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectorError::Transport(e) => Some(e),
            ConnectorError::Malformed(e) => Some(e),
            ConnectorError::Encoding(e) => Some(e),
            ConnectorError::Json(e) => Some(e),
            ConnectorError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for ConnectorError {
    fn from(e: TransportError) -> Self {
        ConnectorError::Transport(e)
    }
}

impl From<DecodeError> for ConnectorError {
    fn from(e: DecodeError) -> Self {
        ConnectorError::Malformed(e)
    }
}

impl From<EncodingError> for ConnectorError {
    fn from(e: EncodingError) -> Self {
        ConnectorError::Encoding(e)
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::Json(e)
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(e: std::io::Error) -> Self {
        ConnectorError::Io(e)
    }
}

/// Crate-level Result alias using [`ConnectorError`].
pub type Result<T> = std::result::Result<T, ConnectorError>;
