//! Title and author extraction from library paths.
//!
//! Recognized layouts, relative to the library root:
//!
//! - `Title - Author.ext`
//! - `Author/Title/Title.ext`
//! - `Author/Title.ext`
//! - `Title.ext`

use std::path::{Component, Path};
use std::sync::OnceLock;

use regex::Regex;

/// Title and author as they appear in a path, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMetadata {
    pub title: String,
    /// Empty when no author could be found.
    pub author: String,
}

/// Author directories rarely contain runs of digits or brackets; those are
/// usually titles or release tags.
fn author_dir_reject() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{2,}|\(|\[").expect("valid regex"))
}

/// Extract title and author from a path relative to the library root.
pub fn extract(relative: &Path) -> PathMetadata {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (title, author) = match stem.split_once(" - ") {
        Some((title, author)) => (title.trim(), author.trim()),
        None => (stem.trim(), ""),
    };

    let mut author = author.to_string();
    if author.is_empty() {
        let dirs: Vec<&str> = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(name) => name.to_str(),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let candidate = match dirs.len() {
            0 => None,
            1 => Some(dirs[0]),
            n => Some(dirs[n - 2]),
        };

        if let Some(dir) = candidate.filter(|dir| !author_dir_reject().is_match(dir)) {
            author = dir.to_string();
        }
    }

    PathMetadata {
        title: title.to_string(),
        author,
    }
}
