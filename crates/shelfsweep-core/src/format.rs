//! Ebook formats and the format priority table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Extensions of metadata files that travel alongside a book.
pub const SIDECAR_EXTENSIONS: &[&str] = &["opf", "jpg", "jpeg", "png", "gif", "nfo", "xml"];

/// Check if an extension (without the dot, any case) belongs to a sidecar file.
pub fn is_sidecar_extension(ext: &str) -> bool {
    SIDECAR_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// A recognized ebook format.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BookFormat {
    Epub,
    Mobi,
    Azw3,
    Azw,
    Fb2,
    Cbz,
    Cbr,
    Pdf,
    Txt,
}

impl BookFormat {
    /// Parse a format from an extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.strip_prefix('.').unwrap_or(ext).parse().ok()
    }

    /// Detect the format of a path from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Lower-case extension without the dot.
    pub fn extension(self) -> &'static str {
        self.into()
    }

    /// Built-in priority; higher wins.
    pub fn default_priority(self) -> i32 {
        match self {
            Self::Epub => 100,
            Self::Mobi => 90,
            Self::Azw3 => 85,
            Self::Azw => 80,
            Self::Fb2 => 70,
            Self::Cbz => 60,
            Self::Cbr => 55,
            Self::Pdf => 10,
            Self::Txt => 5,
        }
    }
}

/// Priority per format.
///
/// Always holds an entry for every [`BookFormat`]: values read from
/// configuration override the built-in defaults one format at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<BookFormat, i32>")]
pub struct FormatPriorities(BTreeMap<BookFormat, i32>);

impl FormatPriorities {
    /// Priority for a format.
    pub fn get(&self, format: BookFormat) -> i32 {
        self.0
            .get(&format)
            .copied()
            .unwrap_or_else(|| format.default_priority())
    }

    /// Override the priority of one format.
    pub fn with(mut self, format: BookFormat, priority: i32) -> Self {
        self.0.insert(format, priority);
        self
    }

    /// Reject tables that cannot rank formats sensibly.
    pub fn validate(&self) -> Result<(), String> {
        for (format, priority) in &self.0 {
            if *priority < 0 {
                return Err(format!("priority for {format} must not be negative (got {priority})"));
            }
        }
        Ok(())
    }
}

impl Default for FormatPriorities {
    fn default() -> Self {
        Self(
            BookFormat::iter()
                .map(|format| (format, format.default_priority()))
                .collect(),
        )
    }
}

impl From<BTreeMap<BookFormat, i32>> for FormatPriorities {
    fn from(overrides: BTreeMap<BookFormat, i32>) -> Self {
        let mut priorities = Self::default();
        priorities.0.extend(overrides);
        priorities
    }
}
