//! Transport abstraction
//!
//! The protocol engine only needs a half-duplex byte pipe with a
//! "bytes waiting" query and a receive-buffer reset. Wrapping that in a
//! trait lets the same engine run over the logger's USB serial console, its
//! WiFi TCP bridge, or a scripted channel in tests.
//!
//! A channel has exactly one owner. The engine's line buffer state lives
//! above the channel, so two concurrent users of one channel would corrupt
//! each other's line boundaries; nothing here is cloneable.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Byte transport consumed by the protocol engine.
pub trait CommunicationChannel: Read + Write + Send {
    /// Number of received bytes waiting to be read, without blocking.
    fn bytes_to_read(&mut self) -> io::Result<u32>;

    /// Discard all received-but-unread bytes.
    fn clear_input_buffer(&mut self) -> io::Result<()>;

    /// Discard or push out any unsent bytes.
    fn clear_output_buffer(&mut self) -> io::Result<()>;
}

/// Serial port wrapper implementing [`CommunicationChannel`]
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an open serial port.
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl CommunicationChannel for SerialChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn clear_output_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Output)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

/// TCP stream wrapper implementing [`CommunicationChannel`]
///
/// The logger firmware runs a network server next to its serial console;
/// this channel talks to a TCP bridge exposing the same line protocol.
pub struct TcpChannel {
    stream: TcpStream,
}

impl TcpChannel {
    /// Wrap a connected TCP stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

impl Read for TcpChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl CommunicationChannel for TcpChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        // No FIONREAD equivalent on a portable TcpStream; a non-blocking
        // peek reports how much is queued.
        self.stream.set_nonblocking(true)?;
        let mut buf = [0u8; 8192];
        let result = self.stream.peek(&mut buf);
        self.stream.set_nonblocking(false)?;

        match result {
            Ok(n) => Ok(n as u32),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        // TCP has no buffer-reset syscall; drain until the socket runs dry.
        self.stream.set_nonblocking(true)?;
        let mut buf = [0u8; 1024];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => break, // EOF
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    let _ = self.stream.set_nonblocking(false);
                    return Err(e);
                }
            }
        }
        self.stream.set_nonblocking(false)?;
        Ok(())
    }

    fn clear_output_buffer(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
