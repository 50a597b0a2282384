//! JWalk-based library scanner.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, info, warn};

use shelfsweep_core::{
    BookFormat, Catalog, DedupConfig, FileRecord, ScanError, ScanItem, ScanWarning,
    SidecarRecord, WarningKind, is_sidecar_extension,
};

use crate::metadata;

/// Sequential scanner over an ebook library.
///
/// Traversal is serial and sorted by file name, so two scans of the same
/// tree yield items in the same order.
#[derive(Debug, Clone)]
pub struct BookScanner {
    root: PathBuf,
    include_hidden: bool,
    ignore: GlobSet,
}

impl BookScanner {
    /// Create a scanner for the configured library root.
    ///
    /// Fails if the root is missing, not a directory, or unreadable, or if an
    /// ignore pattern is not a valid glob.
    pub fn new(config: &DedupConfig) -> Result<Self, ScanError> {
        let root = config
            .books_dir
            .canonicalize()
            .map_err(|e| ScanError::io(&config.books_dir, e))?;

        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        // Surface an unreadable root here rather than as a per-entry warning.
        std::fs::read_dir(&root).map_err(|e| ScanError::io(&root, e))?;

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("bad ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self {
            root,
            include_hidden: config.include_hidden,
            ignore,
        })
    }

    /// Canonical root being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the library, yielding books, sidecars and warnings.
    pub fn iter(&self) -> impl Iterator<Item = ScanItem> + '_ {
        let ignore = self.ignore.clone();

        let walker = WalkDir::new(&self.root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(!self.include_hidden)
            .follow_links(false)
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|child| match child {
                    Ok(entry) => !ignore.is_match(entry.file_name()),
                    Err(_) => true,
                });
            });

        walker.into_iter().filter_map(move |entry| self.classify(entry))
    }

    /// Walk the whole library and collect the results.
    pub fn scan(&self) -> Catalog {
        info!(root = %self.root.display(), "Scanning library");

        let catalog = Catalog::from_items(&self.root, self.iter());

        info!(
            books = catalog.books.len(),
            sidecars = catalog.sidecars.len(),
            warnings = catalog.warnings.len(),
            "Scan complete"
        );
        catalog
    }

    fn classify(
        &self,
        entry: Result<jwalk::DirEntry<((), ())>, jwalk::Error>,
    ) -> Option<ScanItem> {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                warn!(path = %path.display(), error = %err, "Skipping unreadable entry");
                return Some(ScanItem::Warning(entry_warning(path, &err, WarningKind::ReadError)));
            }
        };

        if entry.file_type().is_dir() {
            // jwalk reports a failed directory listing on the directory entry itself.
            let err = entry.read_children_error.as_ref()?;
            let path = entry.path();
            warn!(path = %path.display(), error = %err, "Skipping unreadable directory");
            return Some(ScanItem::Warning(entry_warning(path, err, WarningKind::ReadError)));
        }
        if !entry.file_type().is_file() {
            return None;
        }

        let path = entry.path();
        let ext = path.extension()?.to_str()?;
        let format = BookFormat::from_extension(ext);
        if format.is_none() && !is_sidecar_extension(ext) {
            return None;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping file without metadata");
                return Some(ScanItem::Warning(entry_warning(
                    path,
                    &err,
                    WarningKind::MetadataError,
                )));
            }
        };

        let Some(format) = format else {
            return Some(ScanItem::Sidecar(SidecarRecord::new(path, size)));
        };

        if path.file_stem().and_then(|s| s.to_str()).is_none() {
            warn!(path = %path.display(), "Skipping book with a non UTF-8 name");
            return Some(ScanItem::Warning(ScanWarning::invalid_name(path)));
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
        let depth = relative.components().count().saturating_sub(1);
        let meta = metadata::extract(&relative);

        debug!(path = %relative.display(), %format, size, "Found book");

        Some(ScanItem::Book(FileRecord {
            path,
            relative,
            format,
            size,
            title: meta.title,
            author: meta.author,
            depth,
        }))
    }
}

/// Warning for a jwalk error; permission problems are classified as such.
fn entry_warning(path: PathBuf, err: &jwalk::Error, kind: WarningKind) -> ScanWarning {
    match err.io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            ScanWarning::from_io(path, io)
        }
        _ => ScanWarning::new(path, err.to_string(), kind),
    }
}
