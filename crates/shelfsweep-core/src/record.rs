//! Scanned file records.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::format::BookFormat;

/// One thing a scan reports.
#[derive(Debug, Clone)]
pub enum ScanItem {
    /// An ebook file.
    Book(FileRecord),
    /// A metadata file that may belong to a book.
    Sidecar(SidecarRecord),
    /// An entry that could not be read; it is skipped.
    Warning(ScanWarning),
}

/// An ebook file found during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path.
    pub path: PathBuf,
    /// Path relative to the scanned root.
    pub relative: PathBuf,
    /// Format derived from the extension.
    pub format: BookFormat,
    /// Size in bytes.
    pub size: u64,
    /// Title as parsed from the path (not normalized).
    pub title: String,
    /// Author as parsed from the path, empty when unknown.
    pub author: String,
    /// Number of directories between the root and the file.
    pub depth: usize,
}

impl FileRecord {
    /// File name including the extension.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// File name without the extension.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Directory containing the file.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Whether the file sits in an `Author/Title/` two-level structure.
    pub fn is_structured(&self) -> bool {
        self.depth >= 2
    }
}

/// A metadata file (cover, descriptor) seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarRecord {
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl SidecarRecord {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// File name without the extension.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Directory containing the file.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}
