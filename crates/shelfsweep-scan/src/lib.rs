//! Ebook library scanning for shelfsweep.
//!
//! Walks a library root with jwalk (serial, sorted) and reports every ebook
//! file and every sidecar metadata file it finds. Title and author are read
//! from the path layout.
//!
//! # Example
//!
//! ```rust,no_run
//! use shelfsweep_scan::{BookScanner, DedupConfig};
//!
//! let config = DedupConfig::new("/srv/books");
//! let scanner = BookScanner::new(&config).unwrap();
//! let catalog = scanner.scan();
//!
//! println!("{} books, {} sidecars", catalog.books.len(), catalog.sidecars.len());
//! ```

pub mod metadata;
mod scanner;

pub use metadata::PathMetadata;
pub use scanner::BookScanner;

// Re-export core types for convenience
pub use shelfsweep_core::{
    BookFormat, Catalog, DedupConfig, FileRecord, ScanError, ScanItem, ScanWarning,
    SidecarRecord, WarningKind,
};
