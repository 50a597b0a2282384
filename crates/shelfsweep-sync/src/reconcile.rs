//! Post-run reconciliation of every configured external index.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shelfsweep_core::SyncConfig;

use crate::jellyfin::{JellyfinClient, JellyfinStats};
use crate::library_db::{LibraryDb, LibraryDbStats};
use crate::path_map::PathMapper;

/// Which adapters to run and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub library_db: bool,
    pub jellyfin: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            library_db: true,
            jellyfin: true,
        }
    }
}

/// What the sync stage did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub library_db: Option<LibraryDbStats>,
    pub jellyfin: Option<JellyfinStats>,
    /// Adapters that were not run, with the reason.
    pub skipped: Vec<String>,
    /// Adapter-level errors.
    pub errors: Vec<String>,
}

impl SyncReport {
    /// Errors plus individual Jellyfin request failures.
    pub fn failures(&self) -> usize {
        self.errors.len() + self.jellyfin.map_or(0, |j| j.failures)
    }
}

/// Bring the external indexes in line with the files removed from disk.
///
/// Never fails: every problem is logged and recorded in the report, and no
/// filesystem change is undone.
pub async fn reconcile(
    config: &SyncConfig,
    host_root: &Path,
    deleted: &[PathBuf],
    options: SyncOptions,
) -> SyncReport {
    let mapper = PathMapper::new(host_root, config.container_root.as_str());
    let mut report = SyncReport::default();

    if options.library_db {
        match &config.library_db {
            None => {
                warn!("Library database not configured, skipping");
                report.skipped.push("library database: not configured".into());
            }
            Some(_) if deleted.is_empty() => {
                debug!("No deleted books, skipping library database");
                report.library_db = Some(LibraryDbStats::default());
            }
            Some(path) => {
                info!(path = %path.display(), "Cleaning library database");
                let result = LibraryDb::open(path).and_then(|mut db| {
                    db.remove_books(deleted.iter().map(PathBuf::as_path), &mapper, options.dry_run)
                });
                match result {
                    Ok(stats) => report.library_db = Some(stats),
                    Err(err) => {
                        warn!(error = %err, "Library database cleanup failed");
                        report.errors.push(err.to_string());
                    }
                }
            }
        }
    }

    if options.jellyfin {
        match config.jellyfin() {
            None => {
                warn!("Jellyfin URL or API key not configured, skipping");
                report.skipped.push("jellyfin: not configured".into());
            }
            Some((url, key)) => {
                let timeout = Duration::from_secs(config.timeout_secs);
                let result = match JellyfinClient::new(url, key, timeout) {
                    Ok(client) => {
                        client
                            .clean_library(&mapper, options.dry_run, !deleted.is_empty())
                            .await
                    }
                    Err(err) => Err(err),
                };
                match result {
                    Ok(stats) => report.jellyfin = Some(stats),
                    Err(err) => {
                        warn!(error = %err, "Jellyfin cleanup failed");
                        report.errors.push(err.to_string());
                    }
                }
            }
        }
    }

    report
}
