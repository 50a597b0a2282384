//! Duplicate book detection.
//!
//! Books are grouped by [`NormalizedKey`] (author + title). Within each group
//! of two or more files, members are ranked and the best one becomes the
//! keeper. Grouping and ranking are deterministic, so a dry run and a real
//! run over the same tree agree exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use shelfsweep_core::{Catalog, DedupConfig, FileRecord};

use crate::normalize::NormalizedKey;
use crate::rank::{RankScore, Ranker};

/// A file together with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedFile {
    pub record: FileRecord,
    pub score: RankScore,
}

/// A set of files that are the same book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Key shared by all members.
    pub key: NormalizedKey,

    /// Members ordered best-first; the first one is the keeper.
    pub members: Vec<RankedFile>,
}

impl DuplicateGroup {
    /// The file to keep.
    pub fn keeper(&self) -> &RankedFile {
        &self.members[0]
    }

    /// The files to remove.
    pub fn losers(&self) -> &[RankedFile] {
        &self.members[1..]
    }

    /// Number of files in the group.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Bytes reclaimed by removing every loser.
    pub fn wasted_bytes(&self) -> u64 {
        self.losers().iter().map(|f| f.record.size).sum()
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups, sorted by key.
    pub groups: Vec<DuplicateGroup>,

    /// Number of books analyzed.
    pub files_analyzed: u64,

    /// Number of books that belong to a group.
    pub files_with_duplicates: u64,

    /// Bytes held by losers.
    pub total_wasted_space: u64,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of files that would be removed.
    pub fn loser_count(&self) -> usize {
        self.groups.iter().map(|g| g.losers().len()).sum()
    }
}

/// Duplicate book finder.
#[derive(Debug, Clone, Default)]
pub struct DuplicateFinder {
    ranker: Ranker,
}

impl DuplicateFinder {
    /// Create a finder with a custom ranker.
    pub fn new(ranker: Ranker) -> Self {
        Self { ranker }
    }

    /// Create a finder from the run configuration.
    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(Ranker::from_config(config))
    }

    /// Find duplicate groups among the catalog's books.
    pub fn find_duplicates(&self, catalog: &Catalog) -> DuplicateReport {
        self.find_in(&catalog.books)
    }

    /// Find duplicate groups among arbitrary records.
    pub fn find_in(&self, books: &[FileRecord]) -> DuplicateReport {
        let mut by_key: BTreeMap<NormalizedKey, Vec<&FileRecord>> = BTreeMap::new();
        for book in books {
            by_key
                .entry(NormalizedKey::for_record(book))
                .or_default()
                .push(book);
        }

        let groups: Vec<DuplicateGroup> = by_key
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(key, members)| self.rank_group(key, members))
            .collect();

        let files_with_duplicates = groups.iter().map(|g| g.count() as u64).sum();
        let total_wasted_space = groups.iter().map(DuplicateGroup::wasted_bytes).sum();

        info!(
            groups = groups.len(),
            files = files_with_duplicates,
            "Duplicate analysis complete"
        );

        DuplicateReport {
            groups,
            files_analyzed: books.len() as u64,
            files_with_duplicates,
            total_wasted_space,
        }
    }

    fn rank_group(&self, key: NormalizedKey, members: Vec<&FileRecord>) -> DuplicateGroup {
        let mut ranked: Vec<RankedFile> = members
            .into_iter()
            .map(|record| RankedFile {
                score: self.ranker.score(record),
                record: record.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| Ranker::compare((&a.record, a.score), (&b.record, b.score)));

        debug!(
            %key,
            keeper = %ranked[0].record.relative.display(),
            score = ranked[0].score.value(),
            "Ranked duplicate group"
        );

        DuplicateGroup {
            key,
            members: ranked,
        }
    }
}
