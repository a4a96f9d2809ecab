//! Protocol errors

use thiserror::Error;

/// Errors that can occur during protocol communication
///
/// Only transport-level failures are errors. A deadline expiring before the
/// expected response is an ordinary outcome and is reported through return
/// values (`Ok(false)`, [`super::ExportResult::Partial`],
/// [`super::ExportResult::Empty`]), never through this type.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Not connected to logger")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
