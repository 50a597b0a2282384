//! Analysis algorithms for shelfsweep.
//!
//! This crate turns a scanned [`Catalog`] into a deletion plan:
//!
//! - **Normalization** - Fold titles and authors into a grouping key
//! - **Ranking** - Score each file by format, placement and name
//! - **Duplicate detection** - Group files by key and pick one keeper each
//! - **Planning** - Decide which files, sidecars and directories go
//!
//! Nothing here touches the filesystem.
//!
//! ```rust,ignore
//! use shelfsweep_analyze::{DuplicateFinder, plan};
//! use shelfsweep_scan::{BookScanner, DedupConfig};
//!
//! let config = DedupConfig::new("/srv/books");
//! let catalog = BookScanner::new(&config)?.scan();
//!
//! let report = DuplicateFinder::from_config(&config).find_duplicates(&catalog);
//! let run = plan(&report, &catalog);
//!
//! println!("{} groups, {} files to delete", report.group_count(), run.file_count());
//! ```

mod duplicates;
pub mod normalize;
mod plan;
pub mod rank;

pub use duplicates::{DuplicateFinder, DuplicateGroup, DuplicateReport, RankedFile};
pub use normalize::{NormalizedKey, UNKNOWN_AUTHOR, normalize, normalize_author, normalize_title};
pub use plan::{ActionPlan, PlannedDelete, RunPlan, plan};
pub use rank::{RankScore, Ranker, looks_like_copy};

// Re-export core types
pub use shelfsweep_core::{Catalog, FileRecord};
