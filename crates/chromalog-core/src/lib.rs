//! # Chromalog Core Library
//!
//! Host-side client for the ESP32 chromalog data logger.
//!
//! The logger records color events on its flash filesystem and serves them
//! over a line-oriented serial console. This library provides:
//! - Serial port discovery and configuration for the logger's USB-UART bridge
//! - The `ping`/`export`/`clear` command protocol
//! - Reconstruction of text lines from the raw byte stream
//! - The bracketed `CSV_START`/`CSV_END` export collection
//! - Saving collected exports to CSV files
//!
//! ## Example
//!
//! ```rust,ignore
//! use chromalog_core::protocol::{Connection, ConnectionConfig, Deadline};
//! use std::time::Duration;
//!
//! let mut conn = Connection::new(ConnectionConfig {
//!     port_name: "/dev/ttyUSB0".into(),
//!     ..Default::default()
//! });
//! conn.connect()?;
//!
//! let result = conn.request_export(Deadline::after(Duration::from_secs(5)))?;
//! println!("collected {} rows", result.lines().len());
//! ```

#![warn(missing_docs)]

pub mod datalog;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::datalog::{default_export_path, is_header_row, write_lines};
    pub use crate::protocol::{
        Connection, ConnectionConfig, ConnectionState, Deadline, ExportOptions, ExportResult,
        ExportSession, HostCommand, ProtocolError,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
