//! Action planning.
//!
//! Turns a [`DuplicateReport`] into a [`RunPlan`]: which files and sidecars
//! to delete, and which directories become candidates for pruning. Planning
//! never touches the filesystem; it only reads the [`Catalog`] inventory.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use shelfsweep_core::{Catalog, FileRecord};

use crate::duplicates::{DuplicateGroup, DuplicateReport};
use crate::normalize::NormalizedKey;

/// A single file scheduled for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDelete {
    pub path: PathBuf,
    pub size: u64,
}

/// What to do with one duplicate group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub key: NormalizedKey,
    pub keeper: FileRecord,
    /// Losing book files.
    pub delete_files: Vec<PlannedDelete>,
    /// Metadata files that belonged only to losers.
    pub delete_sidecars: Vec<PlannedDelete>,
    /// Loser directories that hold no tracked files once the run is done.
    pub prune_dirs: Vec<PathBuf>,
}

impl ActionPlan {
    /// Bytes freed by this plan.
    pub fn bytes(&self) -> u64 {
        self.delete_files
            .iter()
            .chain(&self.delete_sidecars)
            .map(|d| d.size)
            .sum()
    }
}

/// Every action of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunPlan {
    /// Canonical library root; never pruned.
    pub root: PathBuf,
    pub plans: Vec<ActionPlan>,
    /// All prune candidates, deduplicated, deepest first.
    pub prune_order: Vec<PathBuf>,
}

impl RunPlan {
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Number of book files to delete.
    pub fn file_count(&self) -> usize {
        self.plans.iter().map(|p| p.delete_files.len()).sum()
    }

    /// Number of sidecars to delete.
    pub fn sidecar_count(&self) -> usize {
        self.plans.iter().map(|p| p.delete_sidecars.len()).sum()
    }

    /// Total bytes freed if every deletion succeeds.
    pub fn bytes(&self) -> u64 {
        self.plans.iter().map(ActionPlan::bytes).sum()
    }
}

/// Build the run plan for a duplicate report.
pub fn plan(report: &DuplicateReport, catalog: &Catalog) -> RunPlan {
    let losers: HashSet<&Path> = report
        .groups
        .iter()
        .flat_map(|g| g.losers())
        .map(|f| f.record.path.as_path())
        .collect();

    // (directory, stem) of every book that stays on disk.
    let survivors: HashSet<(&Path, &str)> = catalog
        .books
        .iter()
        .filter(|b| !losers.contains(b.path.as_path()))
        .map(|b| (b.parent(), b.stem()))
        .collect();

    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut deleted_per_dir: HashMap<PathBuf, usize> = HashMap::new();

    let mut plans: Vec<ActionPlan> = report
        .groups
        .iter()
        .map(|group| {
            let plan = plan_group(group, catalog, &survivors, &mut claimed);
            for delete in plan.delete_files.iter().chain(&plan.delete_sidecars) {
                if let Some(parent) = delete.path.parent() {
                    *deleted_per_dir.entry(parent.to_path_buf()).or_default() += 1;
                }
            }
            plan
        })
        .collect();

    let emptied = |dir: &Path| {
        dir != catalog.root
            && dir.starts_with(&catalog.root)
            && deleted_per_dir.get(dir).copied().unwrap_or(0) >= catalog.tracked_in(dir)
    };

    let mut all_prunes = BTreeSet::new();
    for plan in &mut plans {
        let mut dirs: Vec<PathBuf> = plan
            .delete_files
            .iter()
            .filter_map(|d| d.path.parent())
            .filter(|dir| emptied(*dir))
            .map(Path::to_path_buf)
            .collect();
        dirs.sort();
        dirs.dedup();
        all_prunes.extend(dirs.iter().cloned());
        plan.prune_dirs = dirs;
    }

    let mut prune_order: Vec<PathBuf> = all_prunes.into_iter().collect();
    prune_order.sort_by(|a, b| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });

    debug!(
        plans = plans.len(),
        prune = prune_order.len(),
        "Run plan built"
    );

    RunPlan {
        root: catalog.root.clone(),
        plans,
        prune_order,
    }
}

fn plan_group(
    group: &DuplicateGroup,
    catalog: &Catalog,
    survivors: &HashSet<(&Path, &str)>,
    claimed: &mut HashSet<PathBuf>,
) -> ActionPlan {
    let mut delete_files = Vec::new();
    let mut delete_sidecars = Vec::new();

    for loser in group.losers() {
        let record = &loser.record;
        delete_files.push(PlannedDelete {
            path: record.path.clone(),
            size: record.size,
        });

        if survivors.contains(&(record.parent(), record.stem())) {
            continue;
        }
        for sidecar in catalog.sidecars_for(record) {
            if claimed.insert(sidecar.path.clone()) {
                delete_sidecars.push(PlannedDelete {
                    path: sidecar.path.clone(),
                    size: sidecar.size,
                });
            }
        }
    }

    ActionPlan {
        key: group.key.clone(),
        keeper: group.keeper().record.clone(),
        delete_files,
        delete_sidecars,
        prune_dirs: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::DuplicateFinder;
    use shelfsweep_core::{BookFormat, ScanItem, SidecarRecord};

    fn book(relative: &str, title: &str, author: &str) -> ScanItem {
        let relative = PathBuf::from(relative);
        ScanItem::Book(FileRecord {
            path: PathBuf::from("/lib").join(&relative),
            format: BookFormat::from_path(&relative).unwrap(),
            size: 100,
            title: title.to_string(),
            author: author.to_string(),
            depth: relative.components().count() - 1,
            relative,
        })
    }

    fn sidecar(path: &str) -> ScanItem {
        ScanItem::Sidecar(SidecarRecord::new(path, 5))
    }

    fn run(items: Vec<ScanItem>) -> RunPlan {
        let catalog = Catalog::from_items("/lib", items);
        let report = DuplicateFinder::default().find_duplicates(&catalog);
        plan(&report, &catalog)
    }

    #[test]
    fn test_keeper_never_deleted() {
        let plan = run(vec![
            book("A/T/t.epub", "T", "A"),
            book("A/T/t.pdf", "T", "A"),
            book("t - A.mobi", "t", "A"),
        ]);

        assert_eq!(plan.plans.len(), 1);
        let action = &plan.plans[0];
        assert!(
            action
                .delete_files
                .iter()
                .all(|d| d.path != action.keeper.path)
        );
        assert_eq!(action.delete_files.len(), 2);
    }

    #[test]
    fn test_sidecar_shared_with_keeper_is_kept() {
        let plan = run(vec![
            book("A/T/book.epub", "book", "A"),
            book("A/T/book.pdf", "book", "A"),
            sidecar("/lib/A/T/book.opf"),
        ]);

        assert_eq!(plan.file_count(), 1);
        assert_eq!(plan.sidecar_count(), 0);
        assert!(plan.prune_order.is_empty());
    }

    #[test]
    fn test_sidecar_claimed_once() {
        let plan = run(vec![
            book("A/T/book.epub", "T", "A"),
            book("loose/book.pdf", "T", "A"),
            book("loose/book.mobi", "T", "A"),
            sidecar("/lib/loose/book.opf"),
        ]);

        assert_eq!(plan.file_count(), 2);
        assert_eq!(plan.sidecar_count(), 1);
        assert_eq!(plan.prune_order, vec![PathBuf::from("/lib/loose")]);
    }

    #[test]
    fn test_directory_with_other_tracked_files_not_pruned() {
        let plan = run(vec![
            book("A/T/book.epub", "T", "A"),
            book("loose/book.pdf", "T", "A"),
            book("loose/other.epub", "Other", "A"),
        ]);

        assert_eq!(plan.file_count(), 1);
        assert!(plan.prune_order.is_empty());
    }

    #[test]
    fn test_root_is_never_pruned() {
        let plan = run(vec![
            book("A/T/book.epub", "T", "A"),
            book("T - A.pdf", "T", "A"),
        ]);

        assert_eq!(plan.file_count(), 1);
        assert!(plan.prune_order.is_empty());
    }

    #[test]
    fn test_prune_order_is_deepest_first() {
        let plan = run(vec![
            book("Keep/A/T/t.epub", "T", "A"),
            book("x/t.pdf", "T", "A"),
            book("y/z/t.mobi", "T", "A"),
        ]);

        assert_eq!(
            plan.prune_order,
            vec![PathBuf::from("/lib/y/z"), PathBuf::from("/lib/x")]
        );
    }
}
