use shelfsweep_analyze::{DuplicateFinder, RunPlan, plan};
use shelfsweep_ops::{DeleteStatus, EntryKind, Executor, Mode};
use shelfsweep_scan::{BookScanner, DedupConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"book").unwrap();
}

fn plan_for(root: &Path) -> RunPlan {
    let scanner = BookScanner::new(&DedupConfig::new(root)).unwrap();
    let catalog = scanner.scan();
    let report = DuplicateFinder::default().find_duplicates(&catalog);
    plan(&report, &catalog)
}

fn library() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Frank Herbert/Dune/Dune.epub");
    write(temp.path(), "Dune - Frank Herbert.pdf");
    write(temp.path(), "Dune - Frank Herbert.opf");
    write(temp.path(), "Dune - Frank Herbert.jpg");
    write(temp.path(), "loose/Dune - Frank Herbert.mobi");
    write(temp.path(), "book.pdf");
    write(temp.path(), "book (1).pdf");
    write(temp.path(), "Shared/Solaris.epub");
    write(temp.path(), "Shared/Solaris.pdf");
    write(temp.path(), "Shared/Other.epub");
    temp
}

#[test]
fn test_dry_run_and_execute_agree() {
    let temp = library();

    let dry = Executor::new(Mode::DryRun).run(&plan_for(temp.path()));
    assert!(dry.dry_run);
    assert!(temp.path().join("book (1).pdf").exists());
    assert!(
        dry.outcomes
            .iter()
            .all(|o| o.status == DeleteStatus::WouldDelete)
    );

    let real = Executor::new(Mode::Execute).run(&plan_for(temp.path()));
    assert!(!real.has_failures());

    assert_eq!(dry.file_targets(), real.file_targets());
    assert_eq!(dry.deleted_files, real.deleted_files);
    assert_eq!(dry.deleted_sidecars, real.deleted_sidecars);
    assert_eq!(dry.bytes_freed, real.bytes_freed);
}

#[test]
fn test_execute_keeps_one_copy_and_prunes() {
    let temp = library();
    let root = temp.path();

    let summary = Executor::new(Mode::Execute).run(&plan_for(root));

    assert_eq!(summary.groups, 3);
    assert_eq!(summary.kept, 3);
    assert_eq!(summary.deleted_files, 4);
    assert_eq!(summary.deleted_sidecars, 2);
    assert_eq!(summary.pruned_dirs, 1);

    assert!(root.join("Frank Herbert/Dune/Dune.epub").exists());
    assert!(!root.join("Dune - Frank Herbert.pdf").exists());
    assert!(!root.join("Dune - Frank Herbert.opf").exists());
    assert!(!root.join("Dune - Frank Herbert.jpg").exists());
    assert!(!root.join("loose").exists());

    assert!(root.join("book.pdf").exists());
    assert!(!root.join("book (1).pdf").exists());

    // One of two books removed: the directory stays.
    assert!(root.join("Shared/Solaris.epub").exists());
    assert!(!root.join("Shared/Solaris.pdf").exists());
    assert!(root.join("Shared").is_dir());
}

#[test]
fn test_second_run_is_a_no_op() {
    let temp = library();

    Executor::new(Mode::Execute).run(&plan_for(temp.path()));
    let again = plan_for(temp.path());
    assert!(again.is_empty());

    let summary = Executor::new(Mode::Execute).run(&again);
    assert_eq!(summary.groups, 0);
    assert!(summary.outcomes.is_empty());
}

#[test]
fn test_vanished_file_does_not_stop_the_run() {
    let temp = library();
    let run = plan_for(temp.path());

    fs::remove_file(temp.path().join("book (1).pdf")).unwrap();
    let summary = Executor::new(Mode::Execute).run(&run);

    assert_eq!(summary.failures, 1);
    let failed: Vec<_> = summary.failed().collect();
    assert_eq!(failed[0].kind, EntryKind::Book);
    assert!(failed[0].path.ends_with("book (1).pdf"));
    assert!(!temp.path().join("Dune - Frank Herbert.pdf").exists());
}
