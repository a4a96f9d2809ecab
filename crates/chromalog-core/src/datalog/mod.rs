//! Export persistence
//!
//! Writes collected export lines to disk. The logger's rows are already
//! CSV; persistence is a verbatim, newline-terminated dump. The engine
//! guarantees ordering and nothing else, and this module preserves that.

use chrono::Local;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// First field of the header row the logger firmware writes when it
/// creates a fresh CSV file.
const HEADER_FIRST_FIELD_PREFIX: &str = "Timestamp";

/// Is this line the device's CSV header row rather than a data row?
///
/// Matches on the first comma-separated field so minor firmware revisions
/// of the remaining column labels still register as a header.
pub fn is_header_row(line: &str) -> bool {
    line.split(',')
        .next()
        .is_some_and(|field| field.trim().starts_with(HEADER_FIRST_FIELD_PREFIX))
}

/// Write collected export lines to a file, one per line.
pub fn write_lines<P: AsRef<Path>>(path: P, lines: &[String]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for line in lines {
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}

/// Default output path for an export started now, in the current directory.
pub fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "chromalog_export_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
