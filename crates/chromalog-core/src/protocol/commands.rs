//! Protocol commands
//!
//! Defines the text commands the logger's serial console understands. Each
//! command is a single word terminated by a newline; the logger answers
//! with newline-terminated text lines.

use serde::{Deserialize, Serialize};

/// Acknowledgement token for a liveness probe
pub const PONG_TOKEN: &str = "OK:PONG";

/// Acknowledgement token for a completed clear
pub const CLEAR_ACK_TOKEN: &str = "OK:CSV_CLEARED";

/// Commands understood by the logger firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Liveness probe (`ping`)
    Ping,

    /// Request the bracketed CSV export (`export`)
    Export,

    /// Erase the on-flash CSV file (`clear`)
    Clear,
}

impl HostCommand {
    /// The command word as it appears on the wire.
    pub fn wire_text(&self) -> &'static str {
        match self {
            HostCommand::Ping => "ping",
            HostCommand::Export => "export",
            HostCommand::Clear => "clear",
        }
    }

    /// Acknowledgement token the logger prints for this command, if any.
    ///
    /// Matched by containment, not equality: the firmware is free to
    /// decorate acknowledgement lines. `Export` has no single ack line; its
    /// response is the `CSV_START`/`CSV_END` bracket handled by
    /// [`super::ExportSession`].
    pub fn ack_token(&self) -> Option<&'static str> {
        match self {
            HostCommand::Ping => Some(PONG_TOKEN),
            HostCommand::Export => None,
            HostCommand::Clear => Some(CLEAR_ACK_TOKEN),
        }
    }

    /// Default response budget in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        match self {
            HostCommand::Ping => 2000,
            HostCommand::Export => super::DEFAULT_TIMEOUT_MS, // bulk transfer takes longest
            HostCommand::Clear => 3000, // flash erase plus file recreation
        }
    }

    /// Wire encoding: command word plus the terminating newline.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.wire_text().as_bytes().to_vec();
        bytes.push(b'\n');
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_text() {
        assert_eq!(HostCommand::Ping.wire_text(), "ping");
        assert_eq!(HostCommand::Export.wire_text(), "export");
        assert_eq!(HostCommand::Clear.wire_text(), "clear");
    }

    #[test]
    fn test_to_bytes_newline_terminated() {
        assert_eq!(HostCommand::Ping.to_bytes(), b"ping\n".to_vec());
        assert_eq!(HostCommand::Export.to_bytes(), b"export\n".to_vec());
    }

    #[test]
    fn test_ack_tokens() {
        assert_eq!(HostCommand::Ping.ack_token(), Some("OK:PONG"));
        assert_eq!(HostCommand::Clear.ack_token(), Some("OK:CSV_CLEARED"));
        assert_eq!(HostCommand::Export.ack_token(), None);
    }
}
