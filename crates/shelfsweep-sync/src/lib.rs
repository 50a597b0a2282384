//! External index reconciliation for shelfsweep.
//!
//! After files are removed from the library, two external indexes may still
//! point at them:
//!
//! - a LazyLibrarian SQLite database ([`LibraryDb`]), whose `books.BookFile`
//!   column stores container paths;
//! - a Jellyfin server ([`JellyfinClient`]), whose `Book` items are removed
//!   when their file is gone or is a metadata file.
//!
//! [`reconcile`] runs whichever adapters are configured. Adapter failures are
//! reported, never propagated.

mod error;
pub mod jellyfin;
mod library_db;
mod path_map;
mod reconcile;

pub use error::SyncError;
pub use jellyfin::{ItemState, JellyfinClient, JellyfinItem, JellyfinStats};
pub use library_db::{LibraryDb, LibraryDbStats};
pub use path_map::PathMapper;
pub use reconcile::{SyncOptions, SyncReport, reconcile};
