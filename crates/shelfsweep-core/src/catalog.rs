//! Collected scan results.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ScanWarning;
use crate::record::{FileRecord, ScanItem, SidecarRecord};

/// Everything one scan found, plus a per-directory inventory of tracked files.
///
/// Tracked files are books and sidecars; anything else in the tree is
/// invisible to shelfsweep.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    /// Ebook files, in traversal order.
    pub books: Vec<FileRecord>,
    /// Metadata files, in traversal order.
    pub sidecars: Vec<SidecarRecord>,
    /// Non-fatal problems met during the scan.
    pub warnings: Vec<ScanWarning>,
    tracked_per_dir: HashMap<PathBuf, usize>,
    sidecars_per_dir: HashMap<PathBuf, Vec<usize>>,
}

impl Catalog {
    /// Create an empty catalog for a root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Build a catalog from scan items.
    pub fn from_items(root: impl Into<PathBuf>, items: impl IntoIterator<Item = ScanItem>) -> Self {
        let mut catalog = Self::new(root);
        for item in items {
            catalog.push(item);
        }
        catalog
    }

    /// Add one scan item.
    pub fn push(&mut self, item: ScanItem) {
        match item {
            ScanItem::Book(record) => {
                *self
                    .tracked_per_dir
                    .entry(record.parent().to_path_buf())
                    .or_default() += 1;
                self.books.push(record);
            }
            ScanItem::Sidecar(sidecar) => {
                let parent = sidecar.parent().to_path_buf();
                *self.tracked_per_dir.entry(parent.clone()).or_default() += 1;
                self.sidecars_per_dir
                    .entry(parent)
                    .or_default()
                    .push(self.sidecars.len());
                self.sidecars.push(sidecar);
            }
            ScanItem::Warning(warning) => self.warnings.push(warning),
        }
    }

    /// Number of tracked files directly inside `dir`.
    pub fn tracked_in(&self, dir: &Path) -> usize {
        self.tracked_per_dir.get(dir).copied().unwrap_or(0)
    }

    /// Sidecars in the same directory as `book` that share its stem.
    pub fn sidecars_for<'a>(
        &'a self,
        book: &'a FileRecord,
    ) -> impl Iterator<Item = &'a SidecarRecord> + 'a {
        self.sidecars_per_dir
            .get(book.parent())
            .into_iter()
            .flatten()
            .map(|&idx| &self.sidecars[idx])
            .filter(move |sidecar| sidecar.stem() == book.stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BookFormat;

    fn book(path: &str) -> FileRecord {
        let path = PathBuf::from(path);
        FileRecord {
            relative: path.strip_prefix("/lib").unwrap().to_path_buf(),
            format: BookFormat::from_path(&path).unwrap(),
            size: 10,
            title: "t".into(),
            author: String::new(),
            depth: 0,
            path,
        }
    }

    #[test]
    fn test_inventory_counts_books_and_sidecars() {
        let catalog = Catalog::from_items(
            "/lib",
            vec![
                ScanItem::Book(book("/lib/a/book.epub")),
                ScanItem::Sidecar(SidecarRecord::new("/lib/a/book.opf", 1)),
                ScanItem::Sidecar(SidecarRecord::new("/lib/a/other.jpg", 1)),
                ScanItem::Book(book("/lib/b/book.pdf")),
            ],
        );

        assert_eq!(catalog.tracked_in(Path::new("/lib/a")), 3);
        assert_eq!(catalog.tracked_in(Path::new("/lib/b")), 1);
        assert_eq!(catalog.tracked_in(Path::new("/lib/c")), 0);
    }

    #[test]
    fn test_sidecars_match_stem_and_directory() {
        let epub = book("/lib/a/book.epub");
        let catalog = Catalog::from_items(
            "/lib",
            vec![
                ScanItem::Book(epub.clone()),
                ScanItem::Sidecar(SidecarRecord::new("/lib/a/book.opf", 1)),
                ScanItem::Sidecar(SidecarRecord::new("/lib/a/book.jpg", 1)),
                ScanItem::Sidecar(SidecarRecord::new("/lib/a/cover.jpg", 1)),
                ScanItem::Sidecar(SidecarRecord::new("/lib/b/book.opf", 1)),
            ],
        );

        let found: Vec<_> = catalog.sidecars_for(&epub).map(|s| s.path.clone()).collect();
        assert_eq!(
            found,
            vec![PathBuf::from("/lib/a/book.opf"), PathBuf::from("/lib/a/book.jpg")]
        );
    }
}
