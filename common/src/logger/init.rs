use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Target used for raw feed messages. Routed to `trades.log` when logging to files.
pub const TRADES_TARGET: &str = "trades";

const TRADES_FILE: &str = "trades.log";
const DEBUG_FILE: &str = "debug.log";

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Where log output goes.
#[derive(Clone, Debug)]
pub enum LogSink {
    /// Human-readable output on stdout, for headless runs.
    Stdout,
    /// Append-only files in the given directory. The terminal belongs to the display.
    Files(PathBuf),
}

pub fn init_logger(service_name: &'static str, sink: &LogSink) -> io::Result<()> {
    LOGGER_INIT.get_or_try_init(|| -> io::Result<()> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match sink {
            LogSink::Stdout => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true) // <-- shows crate/module path
                        .with_thread_ids(true)
                        .with_line_number(true)
                        .with_span_events(fmt::format::FmtSpan::CLOSE),
                )
                .try_init()
                .map_err(io::Error::other)?,

            LogSink::Files(dir) => {
                let (trades, debug) = open_log_files(dir)?;

                let trades_layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(trades))
                    .with_filter(filter_fn(|meta| meta.target() == TRADES_TARGET));

                let debug_layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_span_events(fmt::format::FmtSpan::CLOSE)
                    .with_writer(Mutex::new(debug))
                    .with_filter(filter_fn(|meta| meta.target() != TRADES_TARGET));

                tracing_subscriber::registry()
                    .with(filter)
                    .with(trades_layer)
                    .with(debug_layer)
                    .try_init()
                    .map_err(io::Error::other)?
            }
        }

        tracing::info!(service = service_name, sink = ?sink, "logger initialized");
        Ok(())
    })?;

    Ok(())
}

/// Creates `dir` if needed and opens both log files in append mode.
fn open_log_files(dir: &Path) -> io::Result<(File, File)> {
    fs::create_dir_all(dir)?;

    let open = |name: &str| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(name))
    };

    Ok((open(TRADES_FILE)?, open(DEBUG_FILE)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn log_files_are_created_in_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("log");

        let (mut trades, mut debug) = open_log_files(&dir).unwrap();
        writeln!(trades, "t").unwrap();
        writeln!(debug, "d").unwrap();

        assert!(dir.join(TRADES_FILE).exists());
        assert!(dir.join(DEBUG_FILE).exists());
    }

    #[test]
    fn log_files_are_appended_not_truncated() {
        let tmp = tempfile::tempdir().unwrap();

        {
            let (mut trades, _) = open_log_files(tmp.path()).unwrap();
            writeln!(trades, "first").unwrap();
        }
        {
            let (mut trades, _) = open_log_files(tmp.path()).unwrap();
            writeln!(trades, "second").unwrap();
        }

        let content = fs::read_to_string(tmp.path().join(TRADES_FILE)).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
