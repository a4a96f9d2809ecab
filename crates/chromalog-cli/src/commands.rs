//! Command execution.
//!
//! All user-facing messaging lives here; the core reports outcomes as
//! values and never prints.

use anyhow::{anyhow, Context, Result};
use chromalog_core::datalog::{default_export_path, is_header_row, write_lines};
use chromalog_core::protocol::{
    find_logger_port, list_ports, stream::TcpChannel, Connection, ConnectionConfig, Deadline,
    ExportOptions, ExportResult, ExportSession,
};
use serde_json::json;
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use crate::cli::{Cli, Commands};

/// Exit code for a truncated (partial) export
const EXIT_PARTIAL: u8 = 2;
/// Exit code for an export that produced no data
const EXIT_EMPTY: u8 = 3;

/// Dispatch the parsed command line.
pub fn execute(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Ports => run_ports(cli),
        Commands::Ping => run_ping(cli),
        Commands::Export { output, raw } => run_export(cli, output.clone(), *raw),
        Commands::Clear { verify } => run_clear(cli, *verify),
    }
}

fn run_ports(cli: &Cli) -> Result<ExitCode> {
    let ports = list_ports();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(ExitCode::SUCCESS);
    }

    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(ExitCode::SUCCESS);
    }

    for port in &ports {
        let marker = if port.looks_like_logger() { "  <- logger?" } else { "" };
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}  [{:04x}:{:04x}] {}{}",
                port.name,
                vid,
                pid,
                port.product.as_deref().unwrap_or("-"),
                marker
            ),
            _ => println!("{}{}", port.name, marker),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_ping(cli: &Cli) -> Result<ExitCode> {
    let mut conn = open_connection(cli)?;
    let started = Instant::now();
    let alive = conn.check_liveness(operation_deadline(cli))?;
    let elapsed_ms = started.elapsed().as_millis();

    if cli.json {
        println!("{}", json!({ "alive": alive, "elapsed_ms": elapsed_ms }));
    } else if alive {
        println!("logger answered in {}ms", elapsed_ms);
    } else {
        println!("no response within {}s", cli.timeout);
    }

    Ok(if alive { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_export(cli: &Cli, output: Option<PathBuf>, raw: bool) -> Result<ExitCode> {
    let mut conn = open_connection(cli)?;

    let mut session = if raw {
        ExportSession::new()
    } else {
        ExportSession::with_options(ExportOptions::filtered())
    };
    if cli.verbose && !cli.json {
        session.set_observer(Box::new(|line| eprintln!("  {}", line)));
    }

    let result = conn.export_with_session(session, operation_deadline(cli))?;

    if let ExportResult::Empty = result {
        if cli.json {
            println!("{}", json!({ "outcome": "empty" }));
        } else {
            println!("no export data received (is anything logged?)");
        }
        return Ok(ExitCode::from(EXIT_EMPTY));
    }

    let path = output.unwrap_or_else(default_export_path);
    let lines = result.lines();
    write_lines(&path, lines).with_context(|| format!("writing {}", path.display()))?;

    let header_only = lines.len() == 1 && is_header_row(&lines[0]);

    if cli.json {
        println!(
            "{}",
            json!({
                "outcome": if result.is_complete() { "complete" } else { "partial" },
                "rows": lines.len(),
                "header_only": header_only,
                "file": path.display().to_string(),
            })
        );
    } else if result.is_complete() {
        let note = if header_only { " (header only)" } else { "" };
        println!("saved {} rows to {}{}", lines.len(), path.display(), note);
    } else {
        println!(
            "WARNING: transfer truncated before the end marker; saved {} rows to {}",
            lines.len(),
            path.display()
        );
    }

    Ok(if result.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PARTIAL)
    })
}

fn run_clear(cli: &Cli, verify: bool) -> Result<ExitCode> {
    let mut conn = open_connection(cli)?;
    let deadline = operation_deadline(cli);

    let ok = if verify {
        conn.clear_and_verify(deadline)?
    } else {
        conn.request_clear(deadline)?
    };

    if cli.json {
        println!("{}", json!({ "cleared": ok, "verified": verify && ok }));
    } else if ok && verify {
        println!("log cleared and verified empty");
    } else if ok {
        println!("log cleared");
    } else if verify {
        println!("clear verification FAILED: data still present or device unresponsive");
    } else {
        println!("no clear acknowledgement within {}s", cli.timeout);
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// One deadline for the whole operation, from the caller's budget.
fn operation_deadline(cli: &Cli) -> Deadline {
    Deadline::after(Duration::from_secs(cli.timeout))
}

fn open_connection(cli: &Cli) -> Result<Connection> {
    let port_name = resolve_port(cli)?;
    let config = ConnectionConfig {
        port_name: port_name.clone(),
        baud_rate: cli.baud,
        timeout_ms: cli.timeout.saturating_mul(1000),
        ..Default::default()
    };

    if let Some(addr) = port_name.strip_prefix("tcp:") {
        tracing::debug!(addr, "connecting over TCP bridge");
        let stream =
            TcpStream::connect(addr).with_context(|| format!("connecting to {}", addr))?;
        Ok(Connection::from_channel(
            Box::new(TcpChannel::new(stream)),
            config,
        ))
    } else {
        tracing::debug!(port = %port_name, "opening serial port");
        let mut conn = Connection::new(config);
        conn.connect()
            .with_context(|| format!("connecting to {}", port_name))?;
        Ok(conn)
    }
}

fn resolve_port(cli: &Cli) -> Result<String> {
    if let Some(port) = &cli.port {
        return Ok(port.clone());
    }
    find_logger_port()
        .map(|info| {
            tracing::debug!(port = %info.name, "auto-detected logger port");
            info.name
        })
        .ok_or_else(|| anyhow!("no logger port detected; pass --port"))
}
