mod backup;
mod cli;
mod digest;
mod ledger;
mod monitor;

use cli::{Cli, Command};
use digest::DigestError;
use ledger::Ledger;
use monitor::{MonitorConfig, MonitorError, Outcome, run_check};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct MonitorExitCode;

impl MonitorExitCode {
    /// Exit code used when the monitored file differs from its original.
    fn changed() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used for errors (I/O errors, invalid arguments, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level.as_deref());

    // Change working directory if -C was specified
    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return MonitorExitCode::any_error();
    }

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Check {
            path,
            ledger,
            original_dir,
            changed_dir,
        } => handle_check(path, ledger, original_dir, changed_dir),
        Command::History { filename, ledger } => handle_history(&filename, ledger),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err}");
            MonitorExitCode::any_error()
        }
    }
}

fn handle_check(
    path: PathBuf,
    ledger: PathBuf,
    original_dir: PathBuf,
    changed_dir: PathBuf,
) -> anyhow::Result<ExitCode> {
    let config = MonitorConfig {
        ledger_path: ledger,
        original_dir,
        changed_dir,
    };

    let outcome = match run_check(&config, &path) {
        Ok(outcome) => outcome,
        Err(MonitorError::Digest(DigestError::NotFound(path))) => {
            // Reported, nothing mutated.
            error!("File not found: {}", path.display());
            return Ok(MonitorExitCode::any_error());
        }
        Err(err) => return Err(err.into()),
    };

    match outcome {
        Outcome::FirstObservation { backup } => {
            println!(
                "First observation: original saved to '{}' and original hash recorded.",
                backup.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Unchanged => {
            println!("File is unchanged (matches stored original).");
            Ok(ExitCode::SUCCESS)
        }
        Outcome::DuplicateChange => {
            println!("File modified, but this exact modification was already recorded earlier.");
            Ok(MonitorExitCode::changed())
        }
        Outcome::NewChange { backup } => {
            println!(
                "File modified: saved changed copy to '{}' and recorded changed hash.",
                backup.display()
            );
            Ok(MonitorExitCode::changed())
        }
    }
}

fn handle_history(filename: &str, ledger_path: PathBuf) -> anyhow::Result<ExitCode> {
    let ledger = Ledger::new(ledger_path);
    let records = ledger.records_for(filename)?;

    if records.is_empty() {
        info!("No records for {filename} in {}", ledger.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    println!("History for {filename}:");
    for (i, record) in records.iter().enumerate() {
        println!("Record {}:", i + 1);
        if let Some(original) = &record.original_hash {
            println!("  Original Hash: {original}");
        }
        if let Some(changed) = &record.changed_hash {
            println!("  Changed Hash: {changed}");
        }
        if let Some(recorded_at) = &record.recorded_at {
            println!("  Recorded At: {recorded_at}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: u8, log_level: Option<&str>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = if let Some(level) = log_level {
        EnvFilter::new(level)
    } else if verbose > 0 {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
