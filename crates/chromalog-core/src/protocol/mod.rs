//! Serial Protocol Communication
//!
//! Implements the chromalog line protocol: newline-terminated ASCII commands
//! from the host, newline-terminated text responses from the logger.
//!
//! The logger never initiates an exchange; the host sends a command and
//! polls for the response under a deadline.

pub mod commands;
mod connection;
mod deadline;
mod error;
mod export;
mod line;
pub mod serial;
pub mod stream;

pub use commands::HostCommand;
pub use connection::{Connection, ConnectionConfig, ConnectionState};
pub use deadline::Deadline;
pub use error::ProtocolError;
pub use export::{ExportOptions, ExportResult, ExportSession};
pub use line::LineAssembler;
pub use serial::{clear_buffers, configure_port, find_logger_port, list_ports, open_port, PortInfo};

/// Default baud rate for the logger's serial console
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default response timeout in milliseconds
///
/// Matches the logger's worst observed latency for a full export of a
/// well-filled flash file over 115200 baud.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Idle sleep between receive polls in milliseconds
///
/// A tuning constant, not a correctness requirement; the link's own
/// latency is in the same range.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;
