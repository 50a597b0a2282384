//! Console and run-file logging.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use color_eyre::eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Keeps the file writer alive; dropping it flushes the log.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    pub path: Option<PathBuf>,
}

/// Name of the detailed log for one run.
pub fn log_file_name(mode: &str, started: DateTime<Local>) -> String {
    format!("shelfsweep_{mode}_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber.
///
/// The console shows info (debug with `verbose`) unless `RUST_LOG` says
/// otherwise. When `log_dir` is set, a second layer writes everything at
/// debug level to a per-run file there.
pub fn init(verbose: bool, log_dir: Option<&Path>, mode: &str) -> Result<LogGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let (file_layer, guard, path) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .wrap_err_with(|| format!("Cannot create log directory {}", dir.display()))?;
            let name = log_file_name(mode, Local::now());
            let path = dir.join(&name);

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard), Some(path))
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .wrap_err("Failed to install the log subscriber")?;

    Ok(LogGuard { _file: guard, path })
}
