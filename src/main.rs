//! shelfsweep - ebook library deduplicator.
//!
//! Usage:
//!   shelfsweep --scan-only       Report duplicate groups
//!   shelfsweep --dry-run         Show what would be deleted
//!   shelfsweep                   Deduplicate, prune, clean external indexes
//!   shelfsweep --jellyfin-only   Only clean the Jellyfin library
//!   shelfsweep --help            Show help

mod logging;
mod pipeline;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use tracing::{error, info};

use shelfsweep_core::DedupConfig;

use crate::pipeline::{RunMode, RunOptions};

/// Exit code for errors that stop the run before or during the scan.
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(
    name = "shelfsweep",
    version,
    about = "Deduplicate an ebook library",
    long_about = "shelfsweep finds copies of the same book in an ebook library, keeps the \
                  best one (format, folder layout, file name), deletes the rest along with \
                  their cover and metadata files, and removes the matching LazyLibrarian \
                  and Jellyfin entries.\n\n\
                  The library root and service endpoints come from the config file and \
                  environment (SHELFSWEEP_BOOKS_DIR, SHELFSWEEP_LIBRARY_DB, JELLYFIN_URL, \
                  JELLYFIN_API_KEY, ...)."
)]
struct Cli {
    /// Only scan and report duplicates, do not delete anything
    #[arg(long)]
    scan_only: bool,

    /// Preview changes without executing them
    #[arg(long)]
    dry_run: bool,

    /// Only clean the Jellyfin library, skip deduplication
    #[arg(long, conflicts_with_all = ["no_jellyfin", "scan_only"])]
    jellyfin_only: bool,

    /// Skip Jellyfin cleanup
    #[arg(long)]
    no_jellyfin: bool,

    /// Skip library database cleanup
    #[arg(long)]
    no_library_db: bool,

    /// Move deleted files to the system trash instead of removing them
    #[arg(long)]
    trash: bool,

    /// Configuration file (defaults to <config dir>/shelfsweep/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format for the summary
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Show debug output on the console
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    fn mode(&self) -> RunMode {
        if self.scan_only {
            RunMode::ScanOnly
        } else if self.dry_run {
            RunMode::DryRun
        } else {
            RunMode::Execute
        }
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            mode: self.mode(),
            jellyfin_only: self.jellyfin_only,
            jellyfin: !self.no_jellyfin,
            library_db: !self.no_library_db,
            trash: self.trash,
        }
    }
}

fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("{err:?}");
        return ExitCode::from(EXIT_FATAL);
    }

    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            eprintln!("{err:?}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let config = DedupConfig::load(cli.config.as_deref()).wrap_err("Invalid configuration")?;
    let options = cli.options();

    let guard = logging::init(cli.verbose, config.log_dir.as_deref(), options.mode.label())?;
    if let Some(path) = &guard.path {
        info!(path = %path.display(), "Writing detailed log");
    }

    let outcome = pipeline::run(&config, options)?;

    match cli.format {
        OutputFormat::Text => print!("{}", report::render_text(&outcome)),
        OutputFormat::Json => println!("{}", report::render_json(&outcome)?),
    }

    let code = outcome.exit_code();
    info!(code, failures = outcome.failures(), "Run complete");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flags() {
        let cli = Cli::parse_from(["shelfsweep", "--dry-run", "--scan-only"]);
        assert_eq!(cli.mode(), RunMode::ScanOnly);

        let cli = Cli::parse_from(["shelfsweep", "--dry-run"]);
        assert_eq!(cli.mode(), RunMode::DryRun);

        let cli = Cli::parse_from(["shelfsweep"]);
        assert_eq!(cli.mode(), RunMode::Execute);
    }

    #[test]
    fn test_toggles() {
        let cli = Cli::parse_from(["shelfsweep", "--no-jellyfin", "--no-library-db", "--trash"]);
        let options = cli.options();
        assert!(!options.jellyfin);
        assert!(!options.library_db);
        assert!(options.trash);
    }

    #[test]
    fn test_jellyfin_flags_conflict() {
        assert!(Cli::try_parse_from(["shelfsweep", "--jellyfin-only", "--no-jellyfin"]).is_err());
        assert!(Cli::try_parse_from(["shelfsweep", "--jellyfin-only", "--scan-only"]).is_err());
        assert!(Cli::try_parse_from(["shelfsweep", "book.epub"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
