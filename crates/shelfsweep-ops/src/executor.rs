//! Run plan executor.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shelfsweep_analyze::{PlannedDelete, RunPlan};

use crate::outcome::{DeleteError, DeleteOutcome, DeleteStatus, EntryKind, RunSummary};

/// Whether the executor may touch the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Report what would happen.
    #[default]
    DryRun,
    /// Delete files and prune directories.
    Execute,
}

/// How files are removed in [`Mode::Execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMethod {
    #[default]
    Permanent,
    /// Move to the platform trash.
    Trash,
}

/// Applies a [`RunPlan`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    pub mode: Mode,
    pub method: DeleteMethod,
}

impl Executor {
    /// Create an executor with permanent deletion.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            method: DeleteMethod::Permanent,
        }
    }

    /// Create an executor that moves files to the trash.
    pub fn with_trash(mode: Mode) -> Self {
        Self {
            mode,
            method: DeleteMethod::Trash,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == Mode::DryRun
    }

    /// Apply the plan and return the outcome of every action.
    ///
    /// Per-file failures are recorded and skipped; the rest of the plan
    /// still runs.
    pub fn run(&self, plan: &RunPlan) -> RunSummary {
        let mut summary = RunSummary::new(self.is_dry_run());
        summary.groups = plan.plans.len();
        summary.kept = plan.plans.len();

        for action in &plan.plans {
            info!(
                key = %action.key,
                keep = %action.keeper.path.display(),
                "Keeping best copy"
            );
            for target in &action.delete_files {
                summary.record(self.delete(target, EntryKind::Book));
            }
            for target in &action.delete_sidecars {
                summary.record(self.delete(target, EntryKind::Sidecar));
            }
        }

        if self.is_dry_run() {
            for dir in &plan.prune_order {
                info!(path = %dir.display(), "[DRY RUN] Would remove directory if empty");
                summary.record(DeleteOutcome {
                    path: dir.clone(),
                    kind: EntryKind::Directory,
                    size: 0,
                    status: DeleteStatus::WouldDelete,
                });
            }
        } else {
            let mut pruned = HashSet::new();
            for dir in &plan.prune_order {
                self.prune_upwards(dir, &plan.root, &mut pruned, &mut summary);
            }
        }

        summary
    }

    fn delete(&self, target: &PlannedDelete, kind: EntryKind) -> DeleteOutcome {
        let status = if self.is_dry_run() {
            info!(path = %target.path.display(), %kind, size = target.size, "[DRY RUN] Would delete");
            DeleteStatus::WouldDelete
        } else {
            match self.remove_file(&target.path) {
                Ok(()) => {
                    info!(path = %target.path.display(), %kind, size = target.size, "Deleted");
                    DeleteStatus::Deleted
                }
                Err(err) => {
                    warn!(error = %err, "Delete failed");
                    DeleteStatus::Failed(err.to_string())
                }
            }
        };

        DeleteOutcome {
            path: target.path.clone(),
            kind,
            size: target.size,
            status,
        }
    }

    fn remove_file(&self, path: &Path) -> Result<(), DeleteError> {
        // Check first so a vanished file fails the same way for both methods.
        fs::symlink_metadata(path).map_err(|e| DeleteError::io(path, e))?;

        match self.method {
            DeleteMethod::Permanent => fs::remove_file(path).map_err(|e| DeleteError::io(path, e)),
            DeleteMethod::Trash => trash::delete(path).map_err(|e| DeleteError::Trash {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Remove `dir` if it is empty, then walk up while parents are empty.
    /// Never removes `root` or anything outside it.
    fn prune_upwards(
        &self,
        dir: &Path,
        root: &Path,
        pruned: &mut HashSet<PathBuf>,
        summary: &mut RunSummary,
    ) {
        let mut current = dir.to_path_buf();

        while current != root && current.starts_with(root) {
            if pruned.contains(&current) {
                break;
            }

            match is_empty_dir(&current) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(path = %current.display(), "Directory not empty, keeping");
                    break;
                }
                Err(err) => {
                    debug!(path = %current.display(), error = %err, "Directory not readable, keeping");
                    break;
                }
            }

            let status = match fs::remove_dir(&current) {
                Ok(()) => {
                    info!(path = %current.display(), "Removed empty directory");
                    DeleteStatus::Deleted
                }
                Err(err) => {
                    let err = DeleteError::io(&current, err);
                    warn!(error = %err, "Directory removal failed");
                    DeleteStatus::Failed(err.to_string())
                }
            };

            let removed = status.is_success();
            summary.record(DeleteOutcome {
                path: current.clone(),
                kind: EntryKind::Directory,
                size: 0,
                status,
            });
            if !removed {
                break;
            }

            pruned.insert(current.clone());
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }
    }
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn delete(path: PathBuf, size: u64) -> PlannedDelete {
        PlannedDelete { path, size }
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.pdf");
        fs::write(&file, b"data").unwrap();

        let executor = Executor::new(Mode::DryRun);
        let outcome = executor.delete(&delete(file.clone(), 4), EntryKind::Book);

        assert_eq!(outcome.status, DeleteStatus::WouldDelete);
        assert!(file.exists());
    }

    #[test]
    fn test_vanished_file_is_a_failure() {
        let temp = TempDir::new().unwrap();
        let executor = Executor::new(Mode::Execute);
        let outcome = executor.delete(&delete(temp.path().join("gone.pdf"), 1), EntryKind::Book);

        match outcome.status {
            DeleteStatus::Failed(message) => assert!(message.starts_with("Path vanished")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_prune_climbs_but_stops_at_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let deep = root.join("a/b/c");
        fs::create_dir_all(&deep).unwrap();

        let mut summary = RunSummary::new(false);
        let mut pruned = HashSet::new();
        Executor::new(Mode::Execute).prune_upwards(&deep, &root, &mut pruned, &mut summary);

        assert_eq!(summary.pruned_dirs, 3);
        assert!(!root.join("a").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_prune_stops_at_non_empty_parent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/notes.txt"), b"keep").unwrap();

        let mut summary = RunSummary::new(false);
        let mut pruned = HashSet::new();
        Executor::new(Mode::Execute).prune_upwards(&root.join("a/b"), &root, &mut pruned, &mut summary);

        assert_eq!(summary.pruned_dirs, 1);
        assert!(root.join("a").exists());
    }

    #[test]
    fn test_non_empty_candidate_is_kept() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/untracked.doc"), b"x").unwrap();

        let mut summary = RunSummary::new(false);
        let mut pruned = HashSet::new();
        Executor::new(Mode::Execute).prune_upwards(&root.join("a"), &root, &mut pruned, &mut summary);

        assert_eq!(summary.pruned_dirs, 0);
        assert_eq!(summary.failures, 0);
        assert!(root.join("a").exists());
    }
}
