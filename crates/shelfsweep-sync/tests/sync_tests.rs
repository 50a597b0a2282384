use rusqlite::Connection;
use shelfsweep_core::SyncConfig;
use shelfsweep_sync::{SyncOptions, reconcile};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn seed_db(path: &Path, files: &[&str]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch("CREATE TABLE books (BookID TEXT PRIMARY KEY, BookFile TEXT);")
        .unwrap();
    for (i, file) in files.iter().enumerate() {
        conn.execute(
            "INSERT INTO books (BookID, BookFile) VALUES (?1, ?2)",
            rusqlite::params![i.to_string(), file],
        )
        .unwrap();
    }
}

fn remaining(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn.prepare("SELECT BookFile FROM books ORDER BY BookFile").unwrap();
    let rows = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap();
    rows
}

#[tokio::test]
async fn test_reconcile_library_db_and_skip_unconfigured_jellyfin() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("lazylibrarian.db");
    seed_db(
        &db,
        &["/books/Dune - Frank Herbert.pdf", "/books/Frank Herbert/Dune/Dune.epub"],
    );

    let config = SyncConfig {
        library_db: Some(db.clone()),
        ..Default::default()
    };
    let deleted = vec![PathBuf::from("/srv/books/Dune - Frank Herbert.pdf")];

    let report = reconcile(
        &config,
        Path::new("/srv/books"),
        &deleted,
        SyncOptions::default(),
    )
    .await;

    assert_eq!(report.library_db.unwrap().removed, 1);
    assert!(report.jellyfin.is_none());
    assert_eq!(report.skipped, vec!["jellyfin: not configured".to_string()]);
    assert_eq!(report.failures(), 0);
    assert_eq!(remaining(&db), vec!["/books/Frank Herbert/Dune/Dune.epub"]);
}

#[tokio::test]
async fn test_dry_run_leaves_database_untouched() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("lazylibrarian.db");
    seed_db(&db, &["/books/a.pdf"]);

    let config = SyncConfig {
        library_db: Some(db.clone()),
        ..Default::default()
    };
    let options = SyncOptions {
        dry_run: true,
        jellyfin: false,
        ..Default::default()
    };

    let report = reconcile(
        &config,
        Path::new("/srv/books"),
        &[PathBuf::from("/srv/books/a.pdf")],
        options,
    )
    .await;

    assert_eq!(report.library_db.unwrap().removed, 1);
    assert!(report.skipped.is_empty());
    assert_eq!(remaining(&db), vec!["/books/a.pdf"]);
}

#[tokio::test]
async fn test_missing_database_is_a_sync_failure() {
    let temp = TempDir::new().unwrap();
    let config = SyncConfig {
        library_db: Some(temp.path().join("missing.db")),
        ..Default::default()
    };
    let options = SyncOptions {
        jellyfin: false,
        ..Default::default()
    };

    let report = reconcile(
        &config,
        Path::new("/srv/books"),
        &[PathBuf::from("/srv/books/a.pdf")],
        options,
    )
    .await;

    assert!(report.library_db.is_none());
    assert_eq!(report.failures(), 1);
}

#[tokio::test]
async fn test_unreachable_jellyfin_is_a_sync_failure() {
    let config = SyncConfig {
        jellyfin_url: Some("http://127.0.0.1:9".into()),
        jellyfin_api_key: Some("key".into()),
        timeout_secs: 2,
        ..Default::default()
    };
    let options = SyncOptions {
        library_db: false,
        ..Default::default()
    };

    let report = reconcile(&config, Path::new("/srv/books"), &[], options).await;

    assert!(report.jellyfin.is_none());
    assert_eq!(report.errors.len(), 1);
}
