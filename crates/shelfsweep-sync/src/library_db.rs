//! LazyLibrarian library database cleanup.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SyncError;
use crate::path_map::PathMapper;

/// Counts from one database pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDbStats {
    /// Deleted book paths looked up.
    pub checked: usize,
    /// Paths that had (or in a dry run, have) a row.
    pub removed: usize,
}

/// Handle to the library database.
pub struct LibraryDb {
    path: PathBuf,
    conn: Connection,
}

impl LibraryDb {
    /// Open an existing database for writing. A missing file is an error;
    /// the database is never created.
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        if !path.is_file() {
            return Err(SyncError::DatabaseMissing {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|e| SyncError::database(path, e))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| SyncError::database(path, e))?;

        debug!(path = %path.display(), "Library database opened");
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Remove rows whose `BookFile` points at a deleted file.
    ///
    /// All deletes run in one transaction that is committed once. In a dry
    /// run the rows are only counted.
    pub fn remove_books<'a>(
        &mut self,
        deleted: impl IntoIterator<Item = &'a Path>,
        mapper: &PathMapper,
        dry_run: bool,
    ) -> Result<LibraryDbStats, SyncError> {
        let path = self.path.clone();
        let db_err = |e| SyncError::database(&path, e);

        let tx = self.conn.transaction().map_err(db_err)?;
        let mut stats = LibraryDbStats::default();

        for host_path in deleted {
            let book_file = mapper.to_container(host_path);
            stats.checked += 1;

            if dry_run {
                let rows: i64 = tx
                    .query_row(
                        "SELECT COUNT(*) FROM books WHERE BookFile = ?1",
                        params![book_file],
                        |row| row.get(0),
                    )
                    .map_err(db_err)?;
                if rows > 0 {
                    info!(book_file = %book_file, "[DRY RUN] Would remove library entry");
                    stats.removed += 1;
                }
            } else {
                let rows = tx
                    .execute("DELETE FROM books WHERE BookFile = ?1", params![book_file])
                    .map_err(db_err)?;
                if rows > 0 {
                    info!(book_file = %book_file, "Removed library entry");
                    stats.removed += 1;
                }
            }
        }

        if !dry_run {
            tx.commit().map_err(db_err)?;
        }

        info!(
            checked = stats.checked,
            removed = stats.removed,
            dry_run,
            "Library database cleanup complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(dir: &Path, files: &[&str]) -> PathBuf {
        let path = dir.join("lazylibrarian.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE books (BookID TEXT PRIMARY KEY, BookFile TEXT);")
            .unwrap();
        for (i, file) in files.iter().enumerate() {
            conn.execute(
                "INSERT INTO books (BookID, BookFile) VALUES (?1, ?2)",
                params![i.to_string(), file],
            )
            .unwrap();
        }
        path
    }

    fn count(path: &Path) -> i64 {
        Connection::open(path)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_removes_mapped_rows() {
        let temp = TempDir::new().unwrap();
        let db_path = seed(
            temp.path(),
            &["/books/Dune - Frank Herbert.pdf", "/books/Frank Herbert/Dune/Dune.epub"],
        );

        let mapper = PathMapper::new("/srv/books", "/books");
        let mut db = LibraryDb::open(&db_path).unwrap();
        let deleted = [PathBuf::from("/srv/books/Dune - Frank Herbert.pdf")];
        let stats = db
            .remove_books(deleted.iter().map(PathBuf::as_path), &mapper, false)
            .unwrap();

        assert_eq!(stats, LibraryDbStats { checked: 1, removed: 1 });
        assert_eq!(count(&db_path), 1);
    }

    #[test]
    fn test_dry_run_counts_without_deleting() {
        let temp = TempDir::new().unwrap();
        let db_path = seed(temp.path(), &["/books/a.pdf"]);

        let mapper = PathMapper::new("/srv/books", "/books");
        let mut db = LibraryDb::open(&db_path).unwrap();
        let deleted = [PathBuf::from("/srv/books/a.pdf"), PathBuf::from("/srv/books/b.pdf")];
        let stats = db
            .remove_books(deleted.iter().map(PathBuf::as_path), &mapper, true)
            .unwrap();

        assert_eq!(stats.checked, 2);
        assert_eq!(stats.removed, 1);
        assert_eq!(count(&db_path), 1);
    }

    #[test]
    fn test_missing_database_is_not_created() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.db");

        assert!(matches!(
            LibraryDb::open(&path),
            Err(SyncError::DatabaseMissing { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x INTEGER);")
            .unwrap();

        let mut db = LibraryDb::open(&path).unwrap();
        let mapper = PathMapper::new("/srv/books", "/books");
        let result = db.remove_books([Path::new("/srv/books/a.pdf")], &mapper, false);
        assert!(matches!(result, Err(SyncError::Database { .. })));
    }
}
