//! Bracketed export collection
//!
//! The logger answers `export` with a `CSV_START` line, the CSV rows
//! verbatim, and a `CSV_END` line. The end marker is not guaranteed to
//! arrive (the device can reset or stall mid-transfer), so collection is
//! bounded by the caller's deadline and a truncated transfer is reported
//! as such rather than discarded.

use serde::Serialize;

/// Line opening the data block, matched by exact equality
pub const EXPORT_START_MARKER: &str = "CSV_START";

/// Line closing the data block, matched by exact equality
///
/// Equality, not containment: a data row that merely mentions the marker
/// text must never terminate collection.
pub const EXPORT_END_MARKER: &str = "CSV_END";

/// Outcome of one export session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "lines", rename_all = "snake_case")]
pub enum ExportResult {
    /// End marker seen; the block arrived whole.
    Complete(Vec<String>),
    /// Start marker seen and data collected, but the deadline expired
    /// before the end marker.
    Partial(Vec<String>),
    /// No start marker before the deadline, or a start marker followed by
    /// nothing. Lines seen outside the bracket are not export data.
    Empty,
}

impl ExportResult {
    /// Collected data lines, in arrival order. Empty for [`ExportResult::Empty`].
    pub fn lines(&self) -> &[String] {
        match self {
            ExportResult::Complete(lines) | ExportResult::Partial(lines) => lines,
            ExportResult::Empty => &[],
        }
    }

    /// Consume the result, keeping the collected lines.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            ExportResult::Complete(lines) | ExportResult::Partial(lines) => lines,
            ExportResult::Empty => Vec::new(),
        }
    }

    /// Did the transfer arrive whole?
    pub fn is_complete(&self) -> bool {
        matches!(self, ExportResult::Complete(_))
    }
}

/// Collection tuning for an export session
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Data lines starting with any of these prefixes are skipped.
    ///
    /// The firmware interleaves status lines (`OK:DATA_SAVED` when the
    /// button is pressed mid-export, `ERROR:*`) into its console output.
    /// Empty by default: the session collects verbatim unless the caller
    /// opts in.
    pub noise_prefixes: Vec<String>,
}

impl ExportOptions {
    /// Options with the firmware's status-line prefixes filtered out.
    pub fn filtered() -> Self {
        Self {
            noise_prefixes: vec!["OK:".to_string(), "ERROR:".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    AwaitingStart,
    Collecting,
    Done,
}

/// State machine gathering the data lines between the export markers.
///
/// Driven one line at a time via [`offer`](Self::offer); the caller owns
/// the deadline and calls [`into_result`](Self::into_result) either when
/// `offer` reports completion or when the deadline expires. Keeping the
/// machine free of I/O makes every transition testable without a port.
pub struct ExportSession {
    state: SessionState,
    lines: Vec<String>,
    options: ExportOptions,
    observer: Option<Box<dyn FnMut(&str) + Send>>,
}

impl ExportSession {
    /// Session collecting every non-empty data line verbatim.
    pub fn new() -> Self {
        Self::with_options(ExportOptions::default())
    }

    /// Session with explicit collection options.
    pub fn with_options(options: ExportOptions) -> Self {
        Self {
            state: SessionState::AwaitingStart,
            lines: Vec::new(),
            options,
            observer: None,
        }
    }

    /// Attach a hook invoked once per collected data line, for progress
    /// reporting. Kept out of the engine's control flow: the hook cannot
    /// influence collection.
    pub fn set_observer(&mut self, observer: Box<dyn FnMut(&str) + Send>) {
        self.observer = Some(observer);
    }

    /// Feed one received line through the state machine.
    ///
    /// Returns `true` once the end marker has been observed; further lines
    /// are ignored from then on. Marker comparison is exact equality on the
    /// trimmed line.
    pub fn offer(&mut self, line: &str) -> bool {
        let line = line.trim();
        match self.state {
            SessionState::AwaitingStart => {
                // Boot banners, menu echoes and stale output arrive before
                // the bracket opens; none of it is export data.
                if line == EXPORT_START_MARKER {
                    self.state = SessionState::Collecting;
                }
            }
            SessionState::Collecting => {
                if line == EXPORT_END_MARKER {
                    self.state = SessionState::Done;
                } else if !line.is_empty() && !self.is_noise(line) {
                    if let Some(observer) = self.observer.as_mut() {
                        observer(line);
                    }
                    self.lines.push(line.to_string());
                }
            }
            SessionState::Done => {}
        }
        self.state == SessionState::Done
    }

    /// Has the start marker been seen?
    pub fn started(&self) -> bool {
        self.state != SessionState::AwaitingStart
    }

    /// Number of data lines collected so far.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Resolve the session into its outcome.
    ///
    /// Called on end-marker completion or deadline expiry; the state at
    /// that moment decides which result the accumulated lines become.
    pub fn into_result(self) -> ExportResult {
        match self.state {
            SessionState::Done => ExportResult::Complete(self.lines),
            SessionState::Collecting if !self.lines.is_empty() => {
                ExportResult::Partial(self.lines)
            }
            // Start never seen, or seen with nothing after it
            _ => ExportResult::Empty,
        }
    }

    fn is_noise(&self, line: &str) -> bool {
        self.options
            .noise_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
    }
}

impl Default for ExportSession {
    fn default() -> Self {
        Self::new()
    }
}
