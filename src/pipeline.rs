//! One deduplication run: scan, group, plan, execute (or report), sync.

use std::fmt;
use std::path::PathBuf;

use color_eyre::eyre::{Result, WrapErr, bail};
use serde::Serialize;
use tracing::info;

use shelfsweep_analyze::{DuplicateFinder, DuplicateReport, plan};
use shelfsweep_core::DedupConfig;
use shelfsweep_ops::{Executor, Mode, RunSummary};
use shelfsweep_scan::BookScanner;
use shelfsweep_sync::{SyncOptions, SyncReport, reconcile};

/// What a run is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Report duplicate groups only.
    ScanOnly,
    /// Plan and report, mutate nothing.
    DryRun,
    /// Delete, prune and sync.
    Execute,
}

impl RunMode {
    /// Label used in log file names.
    pub fn label(self) -> &'static str {
        match self {
            Self::ScanOnly => "scan",
            Self::DryRun => "dry_run",
            Self::Execute => "execution",
        }
    }
}

/// Run state machine stages, logged as the run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Scan,
    Group,
    Plan,
    DryRunReport,
    Execute,
    Sync,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scan => "SCAN",
            Self::Group => "GROUP",
            Self::Plan => "PLAN",
            Self::DryRunReport => "DRY_RUN_REPORT",
            Self::Execute => "EXECUTE",
            Self::Sync => "SYNC",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    info!(%stage, "Entering stage");
}

/// Flags that shape a run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Skip deduplication and only reconcile Jellyfin.
    pub jellyfin_only: bool,
    pub jellyfin: bool,
    pub library_db: bool,
    pub trash: bool,
}

impl RunOptions {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            jellyfin_only: false,
            jellyfin: true,
            library_db: true,
            trash: false,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Serialize)]
pub struct RunOutcome {
    pub mode: RunMode,
    pub root: PathBuf,
    pub books_scanned: usize,
    pub scan_warnings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<DuplicateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncReport>,
}

impl RunOutcome {
    fn new(mode: RunMode, root: PathBuf) -> Self {
        Self {
            mode,
            root,
            books_scanned: 0,
            scan_warnings: 0,
            duplicates: None,
            summary: None,
            sync: None,
        }
    }

    /// File deletions plus sync failures.
    pub fn failures(&self) -> usize {
        self.summary.as_ref().map_or(0, |s| s.failures)
            + self.sync.as_ref().map_or(0, SyncReport::failures)
    }

    /// 0 on success, 1 when anything failed along the way.
    pub fn exit_code(&self) -> u8 {
        if self.failures() > 0 { 1 } else { 0 }
    }
}

/// Run the pipeline. Errors returned here are fatal.
pub fn run(config: &DedupConfig, options: RunOptions) -> Result<RunOutcome> {
    if options.jellyfin_only && config.sync.jellyfin().is_none() {
        bail!("--jellyfin-only needs a Jellyfin URL and API key (JELLYFIN_URL, JELLYFIN_API_KEY)");
    }

    let root = config
        .books_dir
        .canonicalize()
        .unwrap_or_else(|_| config.books_dir.clone());
    let mut outcome = RunOutcome::new(options.mode, root);

    if !options.jellyfin_only {
        enter(Stage::Scan);
        let scanner = BookScanner::new(config).wrap_err("Cannot scan the library root")?;
        let catalog = scanner.scan();
        outcome.root = scanner.root().to_path_buf();
        outcome.books_scanned = catalog.books.len();
        outcome.scan_warnings = catalog.warnings.len();

        enter(Stage::Group);
        let report = DuplicateFinder::from_config(config).find_duplicates(&catalog);
        info!(
            groups = report.group_count(),
            losers = report.loser_count(),
            "Duplicate groups found"
        );

        if options.mode == RunMode::ScanOnly {
            outcome.duplicates = Some(report);
            enter(Stage::Done);
            return Ok(outcome);
        }

        enter(Stage::Plan);
        let run_plan = plan(&report, &catalog);

        let mode = if options.mode == RunMode::DryRun {
            enter(Stage::DryRunReport);
            Mode::DryRun
        } else {
            enter(Stage::Execute);
            Mode::Execute
        };
        let executor = if options.trash {
            Executor::with_trash(mode)
        } else {
            Executor::new(mode)
        };

        outcome.summary = Some(executor.run(&run_plan));
        outcome.duplicates = Some(report);
    } else if options.mode == RunMode::ScanOnly {
        enter(Stage::Done);
        return Ok(outcome);
    }

    let sync_options = SyncOptions {
        dry_run: options.mode == RunMode::DryRun,
        library_db: options.library_db && !options.jellyfin_only,
        jellyfin: options.jellyfin || options.jellyfin_only,
    };
    if sync_options.library_db || sync_options.jellyfin {
        enter(Stage::Sync);
        let deleted: Vec<PathBuf> = outcome
            .summary
            .as_ref()
            .map(|s| s.removed_books().map(PathBuf::from).collect())
            .unwrap_or_default();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .wrap_err("Failed to start the sync runtime")?;
        let report = runtime.block_on(reconcile(
            &config.sync,
            &outcome.root,
            &deleted,
            sync_options,
        ));
        outcome.sync = Some(report);
    }

    enter(Stage::Done);
    Ok(outcome)
}
