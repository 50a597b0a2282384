//! Per-file outcomes and run totals.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single deletion failed.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The file disappeared between scan and delete.
    #[error("Path vanished: {path}")]
    Vanished { path: PathBuf },

    /// Permission denied.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The system trash refused the file.
    #[error("Could not move {path} to trash: {message}")]
    Trash { path: PathBuf, message: String },
}

impl DeleteError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::Vanished { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

/// What kind of entry an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Book,
    Sidecar,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Book => write!(f, "book"),
            Self::Sidecar => write!(f, "sidecar"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Result of one planned deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum DeleteStatus {
    Deleted,
    WouldDelete,
    Failed(String),
}

impl DeleteStatus {
    /// Whether the entry is (or would be) gone.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// One entry the executor acted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub status: DeleteStatus,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Whether the filesystem was left untouched.
    pub dry_run: bool,
    /// Duplicate groups processed.
    pub groups: usize,
    /// Keepers (one per group).
    pub kept: usize,
    /// Book files deleted (or that would be).
    pub deleted_files: usize,
    /// Sidecars deleted (or that would be).
    pub deleted_sidecars: usize,
    /// Directories pruned (or prune candidates in a dry run).
    pub pruned_dirs: usize,
    /// Bytes freed (or that would be).
    pub bytes_freed: u64,
    /// Deletions that failed.
    pub failures: usize,
    /// Every outcome in execution order.
    pub outcomes: Vec<DeleteOutcome>,
}

impl RunSummary {
    /// Create an empty summary.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Record an outcome and update the totals.
    pub fn record(&mut self, outcome: DeleteOutcome) {
        if outcome.status.is_success() {
            match outcome.kind {
                EntryKind::Book => self.deleted_files += 1,
                EntryKind::Sidecar => self.deleted_sidecars += 1,
                EntryKind::Directory => self.pruned_dirs += 1,
            }
            self.bytes_freed += outcome.size;
        } else {
            self.failures += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Whether any deletion failed.
    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }

    /// Outcomes that failed.
    pub fn failed(&self) -> impl Iterator<Item = &DeleteOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    /// Book paths that were (or would be) removed.
    pub fn removed_books(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.kind == EntryKind::Book && o.status.is_success())
            .map(|o| o.path.as_path())
    }

    /// Book and sidecar paths the run acted on, regardless of status.
    pub fn file_targets(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter(|o| o.kind != EntryKind::Directory)
            .map(|o| o.path.as_path())
            .collect()
    }
}
