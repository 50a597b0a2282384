//! Keeper ranking.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use shelfsweep_core::{DedupConfig, FileRecord, FormatPriorities};

/// Score of one file; the highest-scoring file in a group is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankScore {
    /// Format priority from the table.
    pub format: i32,
    /// Bonus for `Author/Title/file` placement (0 when absent).
    pub structure: i32,
    /// Penalty for copy-like names (0 when absent).
    pub penalty: i32,
}

impl RankScore {
    /// Combined score.
    pub fn value(&self) -> i32 {
        self.format + self.structure - self.penalty
    }
}

/// Matches `(1)`, `[2]`, and standalone `tmp`, `temp`, `copy` tokens.
///
/// Bracketed numbers are capped at two digits so `(2020)` years are not
/// mistaken for copy counters.
fn copy_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)[\[(]\d{1,2}[\])]|(?:^|[^a-z])(?:tmp|temp|copy)(?:[^a-z]|$)")
            .expect("valid regex")
    })
}

/// Check if a file name looks like a copy or temporary file.
pub fn looks_like_copy(file_name: &str) -> bool {
    copy_name_pattern().is_match(file_name)
}

/// Computes [`RankScore`]s.
#[derive(Debug, Clone)]
pub struct Ranker {
    priorities: FormatPriorities,
    structured_bonus: i32,
    temp_penalty: i32,
}

impl Ranker {
    /// Create a ranker from explicit weights.
    pub fn new(priorities: FormatPriorities, structured_bonus: i32, temp_penalty: i32) -> Self {
        Self {
            priorities,
            structured_bonus,
            temp_penalty,
        }
    }

    /// Create a ranker from the run configuration.
    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(
            config.priorities.clone(),
            config.structured_bonus,
            config.temp_penalty,
        )
    }

    /// Score one file.
    pub fn score(&self, record: &FileRecord) -> RankScore {
        RankScore {
            format: self.priorities.get(record.format),
            structure: if record.is_structured() {
                self.structured_bonus
            } else {
                0
            },
            penalty: if looks_like_copy(record.file_name()) {
                self.temp_penalty
            } else {
                0
            },
        }
    }

    /// Order two scored files best-first.
    ///
    /// Higher score wins; ties go to the shorter path, then to the
    /// lexicographically smaller one, so the order is total and stable.
    pub fn compare(a: (&FileRecord, RankScore), b: (&FileRecord, RankScore)) -> Ordering {
        b.1.value()
            .cmp(&a.1.value())
            .then_with(|| {
                a.0.path
                    .as_os_str()
                    .len()
                    .cmp(&b.0.path.as_os_str().len())
            })
            .then_with(|| a.0.path.cmp(&b.0.path))
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(
            FormatPriorities::default(),
            shelfsweep_core::DEFAULT_STRUCTURED_BONUS,
            shelfsweep_core::DEFAULT_TEMP_PENALTY,
        )
    }
}
