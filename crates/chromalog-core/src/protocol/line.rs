//! Incremental line reconstruction from the raw byte stream
//!
//! Serial reads arrive in arbitrary-sized chunks split at arbitrary points,
//! including mid-line and exactly on a newline. The assembler buffers
//! whatever has not yet been terminated and hands back complete lines only.

/// Stateful byte-to-line reconstructor.
///
/// One assembler lives for the lifetime of one open connection and is never
/// reset in between commands: a partial line left over from a previous
/// exchange would otherwise be silently dropped or wrongly glued onto the
/// next response.
#[derive(Debug, Default)]
pub struct LineAssembler {
    /// Bytes received after the last newline seen so far.
    /// Holds no `\n` between calls; any newline is resolved by `poll`.
    buffer: Vec<u8>,
}

impl LineAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from one transport read. Zero-length chunks are fine.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Extract every complete line currently resolvable, in arrival order.
    ///
    /// Lines are decoded lossily (invalid UTF-8 becomes the replacement
    /// character rather than an error; the link has no integrity check, so a
    /// corrupt byte must not kill the whole exchange) and trimmed of
    /// surrounding whitespace, which also strips the `\r` of CRLF-terminated
    /// firmware output. Empty lines are produced as empty strings; callers
    /// that don't want them skip them.
    pub fn poll(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let rest = self.buffer.split_off(pos + 1);
            let segment = std::mem::replace(&mut self.buffer, rest);
            let line = String::from_utf8_lossy(&segment[..pos]).trim().to_string();
            lines.push(line);
        }
        lines
    }

    /// Number of buffered bytes still awaiting a newline.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut asm = LineAssembler::new();
        asm.feed(b"OK:PONG\n");
        assert_eq!(asm.poll(), vec!["OK:PONG"]);
        assert_eq!(asm.pending_len(), 0);
    }

    #[test]
    fn test_partial_line_held_back() {
        let mut asm = LineAssembler::new();
        asm.feed(b"CSV_ST");
        assert!(asm.poll().is_empty());
        asm.feed(b"ART\n");
        assert_eq!(asm.poll(), vec!["CSV_START"]);
    }

    #[test]
    fn test_multiple_lines_one_chunk() {
        let mut asm = LineAssembler::new();
        asm.feed(b"a\nb\nc");
        assert_eq!(asm.poll(), vec!["a", "b"]);
        assert_eq!(asm.pending_len(), 1);
    }

    #[test]
    fn test_crlf_trimmed() {
        let mut asm = LineAssembler::new();
        asm.feed(b"1,2,3\r\n");
        assert_eq!(asm.poll(), vec!["1,2,3"]);
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let mut asm = LineAssembler::new();
        asm.feed(&[b'a', 0xFF, b'b', b'\n']);
        let lines = asm.poll();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "a\u{FFFD}b");
    }

    #[test]
    fn test_blank_line_produced_as_empty() {
        let mut asm = LineAssembler::new();
        asm.feed(b"\n  \n");
        assert_eq!(asm.poll(), vec!["", ""]);
    }

    #[test]
    fn test_poll_without_feed() {
        let mut asm = LineAssembler::new();
        assert!(asm.poll().is_empty());
    }
}
