//! Connection management
//!
//! Handles the connection lifecycle and command exchanges with the logger.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::time::Duration;

use super::{
    commands::{HostCommand, CLEAR_ACK_TOKEN, PONG_TOKEN},
    export::{ExportResult, ExportSession},
    line::LineAssembler,
    serial::{clear_buffers, configure_port, open_port},
    stream::{CommunicationChannel, SerialChannel},
    Deadline, ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Connecting (liveness probe in progress)
    Connecting,
    /// Connected and responsive
    Connected,
    /// Connection error
    Error,
}

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Default response timeout in milliseconds
    pub timeout_ms: u64,
    /// Idle sleep between receive polls in milliseconds
    pub poll_interval_ms: u64,
    /// Settling delay after opening the port in milliseconds.
    /// Opening the port can reset the ESP32; give it time to come back up
    /// before talking to it.
    pub open_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            open_delay_ms: 2000,
        }
    }
}

/// A command/response session with the logger.
///
/// Owns the transport channel and the single [`LineAssembler`] sitting on
/// it. The assembler is never reset while the connection is open (a
/// partial line straddling two exchanges must survive intact), so a
/// connection must not be shared: interleaved commands would corrupt the
/// line-boundary state. All waiting is synchronous, deadline-bounded
/// polling; there are no background tasks.
pub struct Connection {
    /// Transport handle, present while connected
    channel: Option<Box<dyn CommunicationChannel>>,
    /// Line reconstruction state for this connection's receive stream
    assembler: LineAssembler,
    /// Current connection state
    state: ConnectionState,
    /// Connection configuration
    config: ConnectionConfig,
}

impl Connection {
    /// Create a new connection (not yet connected)
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            channel: None,
            assembler: LineAssembler::new(),
            state: ConnectionState::Disconnected,
            config,
        }
    }

    /// Create a connection over an already-open channel.
    ///
    /// Used for the TCP bridge and for tests; skips the serial open
    /// sequence and the liveness probe and reports `Connected` at once.
    pub fn from_channel(channel: Box<dyn CommunicationChannel>, config: ConnectionConfig) -> Self {
        Self {
            channel: Some(channel),
            assembler: LineAssembler::new(),
            state: ConnectionState::Connected,
            config,
        }
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Is the connection open and responsive?
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Open the configured serial port and verify the logger answers.
    ///
    /// Sequence: open, configure (8N1, DTR/RTS held high), wait out the
    /// device's post-open reset, drop whatever it printed while booting,
    /// then run the ping/pong probe. A silent device fails the connect
    /// rather than yielding a half-usable handle.
    pub fn connect(&mut self) -> Result<(), ProtocolError> {
        if self.state == ConnectionState::Connected {
            return Err(ProtocolError::AlreadyConnected);
        }

        self.state = ConnectionState::Connecting;

        let mut port = open_port(&self.config.port_name, Some(self.config.baud_rate))?;
        configure_port(port.as_mut())?;
        clear_buffers(port.as_mut())?;

        tracing::debug!(
            delay_ms = self.config.open_delay_ms,
            "waiting for logger to settle after port open"
        );
        std::thread::sleep(Duration::from_millis(self.config.open_delay_ms));

        // Drop the boot banner and command menu printed during the delay
        clear_buffers(port.as_mut())?;

        self.channel = Some(Box::new(SerialChannel::new(port)));

        // Probe budget: the configured timeout, but a live logger answers a
        // ping well within the command's own default
        let probe_ms = self.config.timeout_ms.min(HostCommand::Ping.timeout_ms());
        let deadline = Deadline::after(Duration::from_millis(probe_ms));
        match self.check_liveness(deadline) {
            Ok(true) => {
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Ok(false) => {
                self.state = ConnectionState::Error;
                self.channel = None;
                Err(ProtocolError::ConnectionFailed(
                    "logger did not answer liveness probe".to_string(),
                ))
            }
            Err(e) => {
                self.state = ConnectionState::Error;
                self.channel = None;
                Err(e)
            }
        }
    }

    /// Close the connection
    pub fn disconnect(&mut self) {
        self.channel = None;
        self.assembler = LineAssembler::new();
        self.state = ConnectionState::Disconnected;
    }

    /// Send one command line.
    ///
    /// The receive buffer is cleared first, always: stale bytes from a
    /// prior exchange must not be mistaken for the new response. The
    /// assembler is deliberately NOT cleared: bytes it already holds were
    /// read after the previous send and belong to this connection's
    /// stream, not to the discarded backlog.
    pub fn send_command(&mut self, command: HostCommand) -> Result<(), ProtocolError> {
        let channel = self.channel.as_mut().ok_or(ProtocolError::NotConnected)?;

        channel
            .clear_input_buffer()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

        channel
            .write_all(&command.to_bytes())
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        channel
            .flush()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

        tracing::debug!(command = command.wire_text(), "command sent");
        Ok(())
    }

    /// Wait for a response line satisfying `predicate`.
    ///
    /// Polls the transport, feeds the assembler, and tests each produced
    /// non-empty line. Returns `Ok(true)` on the first match, `Ok(false)`
    /// once the deadline expires (a timeout is an ordinary outcome here),
    /// and `Err` only if the transport itself fails. Returns within the
    /// deadline plus at most one poll interval.
    pub fn await_response<F>(
        &mut self,
        mut predicate: F,
        deadline: Deadline,
    ) -> Result<bool, ProtocolError>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            if deadline.expired() {
                return Ok(false);
            }
            for line in self.pump_lines()? {
                if line.is_empty() {
                    continue;
                }
                tracing::trace!(line = %line, "response line");
                if predicate(&line) {
                    return Ok(true);
                }
            }
            self.idle_wait(deadline);
        }
    }

    /// Wait for any non-empty response line at all.
    ///
    /// Content-free acceptance, for probing whether something is alive on
    /// the other end of the link.
    pub fn await_any_response(&mut self, deadline: Deadline) -> Result<bool, ProtocolError> {
        self.await_response(|_| true, deadline)
    }

    /// Ping the logger and wait for its pong.
    pub fn check_liveness(&mut self, deadline: Deadline) -> Result<bool, ProtocolError> {
        self.send_command(HostCommand::Ping)?;
        self.await_response(|line| line.contains(PONG_TOKEN), deadline)
    }

    /// Request the bracketed CSV export and collect it under `deadline`.
    pub fn request_export(&mut self, deadline: Deadline) -> Result<ExportResult, ProtocolError> {
        self.export_with_session(ExportSession::new(), deadline)
    }

    /// Run a caller-configured export session (noise filter, observer).
    ///
    /// One deadline bounds the whole session, start-marker wait and
    /// collection together; a device stalling before `CSV_START` cannot be
    /// granted extra total time. Every polled line flows through the
    /// session's state machine, so data sharing a chunk with the start
    /// marker is collected, not dropped.
    pub fn export_with_session(
        &mut self,
        mut session: ExportSession,
        deadline: Deadline,
    ) -> Result<ExportResult, ProtocolError> {
        self.send_command(HostCommand::Export)?;
        loop {
            if deadline.expired() {
                tracing::debug!(
                    started = session.started(),
                    collected = session.line_count(),
                    "export deadline expired"
                );
                return Ok(session.into_result());
            }
            for line in self.pump_lines()? {
                if session.offer(&line) {
                    return Ok(session.into_result());
                }
            }
            self.idle_wait(deadline);
        }
    }

    /// Ask the logger to erase its CSV file; true once it acknowledges.
    pub fn request_clear(&mut self, deadline: Deadline) -> Result<bool, ProtocolError> {
        self.send_command(HostCommand::Clear)?;
        self.await_response(|line| line.contains(CLEAR_ACK_TOKEN), deadline)
    }

    /// Clear, then export to confirm nothing is left.
    ///
    /// One atomic operation instead of two independently racy calls.
    /// Verification passes when the post-clear export is `Empty` or a
    /// `Complete` block of at most one line, since the firmware recreates
    /// the file with its header row immediately after erasing it.
    pub fn clear_and_verify(&mut self, deadline: Deadline) -> Result<bool, ProtocolError> {
        if !self.request_clear(deadline)? {
            return Ok(false);
        }
        match self.export_with_session(ExportSession::new(), deadline)? {
            ExportResult::Empty => Ok(true),
            ExportResult::Complete(lines) => Ok(lines.len() <= 1),
            ExportResult::Partial(_) => Ok(false),
        }
    }

    /// Pull every byte currently readable into the assembler and drain the
    /// complete lines.
    fn pump_lines(&mut self) -> Result<Vec<String>, ProtocolError> {
        let channel = self.channel.as_mut().ok_or(ProtocolError::NotConnected)?;
        let mut buffer = [0u8; 512];

        loop {
            let available = channel
                .bytes_to_read()
                .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
            if available == 0 {
                break;
            }

            let to_read = std::cmp::min(available as usize, buffer.len());
            match channel.read(&mut buffer[..to_read]) {
                Ok(0) => break,
                Ok(n) => self.assembler.feed(&buffer[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    break;
                }
                Err(e) => return Err(ProtocolError::SerialError(e.to_string())),
            }
        }

        Ok(self.assembler.poll())
    }

    /// Sleep one poll interval, clipped to the deadline so a wait never
    /// overshoots by more than the interval itself.
    fn idle_wait(&self, deadline: Deadline) {
        let pause = Duration::from_millis(self.config.poll_interval_ms).min(deadline.remaining());
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
