//! Command-line argument parsing.

use chromalog_core::protocol::DEFAULT_BAUD_RATE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Talk to a chromalog color-event logger over its serial console.
///
/// The logger records a color event each time its button is pressed;
/// this tool downloads the accumulated CSV, checks the device is alive,
/// and erases the log.
#[derive(Parser, Debug)]
#[command(name = "chromalog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Serial port of the logger (e.g. /dev/ttyUSB0), or `tcp:HOST:PORT`
    /// for its network bridge. Auto-detected from USB metadata when
    /// omitted.
    #[arg(short, long, global = true, env = "CHROMALOG_PORT")]
    pub port: Option<String>,

    /// Baud rate of the serial console.
    #[arg(short, long, global = true, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// Overall response budget per operation, in seconds.
    #[arg(short, long, global = true, default_value_t = 5)]
    pub timeout: u64,

    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose diagnostics on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports, marking likely loggers.
    Ports,

    /// Check the logger answers its liveness probe.
    Ping,

    /// Download the logger's CSV export to a file.
    Export {
        /// Output file. Defaults to a timestamped name in the current
        /// directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep firmware status lines (OK:*/ERROR:*) in the output
        /// instead of filtering them out.
        #[arg(long)]
        raw: bool,
    },

    /// Erase the logger's on-flash CSV file.
    Clear {
        /// Export afterwards to confirm nothing but the header is left.
        #[arg(long)]
        verify: bool,
    },
}
