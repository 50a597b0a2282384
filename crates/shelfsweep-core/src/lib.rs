//! Core types and configuration for shelfsweep.
//!
//! This crate provides the data model shared by the scanning, analysis,
//! execution and sync crates: the ebook format ranking table, scanned file
//! records and the catalog a scan produces, configuration, and error types.

mod catalog;
mod config;
mod error;
mod format;
mod record;

pub use catalog::Catalog;
pub use config::{
    ConfigError, DEFAULT_CONTAINER_ROOT, DEFAULT_STRUCTURED_BONUS, DEFAULT_TEMP_PENALTY,
    DedupConfig, DedupConfigBuilder, SyncConfig,
};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use format::{BookFormat, FormatPriorities, SIDECAR_EXTENSIONS, is_sidecar_extension};
pub use record::{FileRecord, ScanItem, SidecarRecord};
