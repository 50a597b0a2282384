//! Sync error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from an external index.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The library database could not be opened or updated.
    #[error("Library database error at {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The library database file does not exist.
    #[error("Library database not found: {path}")]
    DatabaseMissing { path: PathBuf },

    /// An HTTP request failed before a response arrived.
    #[error("Jellyfin request {method} {endpoint} failed: {source}")]
    Http {
        method: &'static str,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Jellyfin answered with a non-success status.
    #[error("Jellyfin request {method} {endpoint} returned {status}")]
    Status {
        method: &'static str,
        endpoint: String,
        status: u16,
    },
}

impl SyncError {
    pub(crate) fn database(path: impl Into<PathBuf>, source: rusqlite::Error) -> Self {
        Self::Database {
            path: path.into(),
            source,
        }
    }
}
