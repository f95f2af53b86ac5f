//! Integration tests for sqlite-exporter
//!
//! Builds small fixture databases with rusqlite and drives full export
//! runs through `ExportRun`, checking the CSV output on disk.

use rusqlite::Connection;
use sqlite_exporter::config::{ExportConfig, InputSource};
use sqlite_exporter::discover::resolve_sources;
use sqlite_exporter::export::{ExportRun, ERROR_LOG_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Chrome-style history fixture: webkit timestamps in urls.last_visit_time,
/// unix-seconds timestamps in events.created_at.
fn create_history_db(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE urls (
             id INTEGER PRIMARY KEY,
             url TEXT,
             title TEXT,
             last_visit_time INTEGER,
             visit_count INTEGER
         );
         CREATE TABLE events (
             id INTEGER PRIMARY KEY,
             name TEXT,
             created_at INTEGER
         );
         CREATE TABLE empty_table (a TEXT, b BLOB);",
    )
    .unwrap();

    let mut stmt = conn
        .prepare(
            "INSERT INTO urls (url, title, last_visit_time, visit_count)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .unwrap();
    for i in 0..10i64 {
        stmt.execute(rusqlite::params![
            format!("https://example.com/page/{i}"),
            format!("Page {i}"),
            13385800000000000i64 + i * 60_000_000,
            i + 1,
        ])
        .unwrap();
    }
    drop(stmt);

    let mut stmt = conn
        .prepare("INSERT INTO events (name, created_at) VALUES (?1, ?2)")
        .unwrap();
    for i in 0..5i64 {
        stmt.execute(rusqlite::params![format!("event{i}"), 1700000000i64 + i * 3600])
            .unwrap();
    }
}

fn config_for(input: InputSource, output_dir: PathBuf) -> ExportConfig {
    ExportConfig {
        input,
        output_dir,
        tables: None,
        limit: None,
        batch_size: 1000,
        sample_rows: 50,
        show_progress: false,
        verbose: false,
    }
}

fn run_export(config: ExportConfig) -> sqlite_exporter::ExportSummary {
    let sources = resolve_sources(&config).unwrap();
    ExportRun::new(config).run(&sources, None).unwrap()
}

#[test]
fn test_exports_all_tables_with_timestamp_columns() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);
    let out = dir.path().join("exports");

    let summary = run_export(config_for(InputSource::File(db), out.clone()));

    assert_eq!(summary.databases_processed, 1);
    assert_eq!(summary.tables_exported, 3);
    assert_eq!(summary.rows_written, 15);
    assert_eq!(summary.error_count(), 0);
    assert!(!summary.interrupted);

    let urls_csv = fs::read_to_string(out.join("History_urls.csv")).unwrap();
    let mut lines = urls_csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,url,title,last_visit_time,visit_count,last_visit_time_converted,last_visit_time_type"
    );
    let first = lines.next().unwrap();
    assert!(first.contains(",2025-"), "expected a 2025 date: {first}");
    assert!(first.ends_with(",webkit"));
    assert_eq!(urls_csv.lines().count(), 11); // header + 10 rows

    let events_csv = fs::read_to_string(out.join("History_events.csv")).unwrap();
    assert!(events_csv.lines().nth(1).unwrap().contains("2023-11-14"));
    assert!(events_csv.lines().nth(1).unwrap().ends_with(",unix"));

    // Empty table gets a header-only CSV
    let empty_csv = fs::read_to_string(out.join("History_empty_table.csv")).unwrap();
    assert_eq!(empty_csv.trim(), "a,b");
}

#[test]
fn test_row_limit_applies_per_table() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);
    let out = dir.path().join("exports");

    let mut config = config_for(InputSource::File(db), out.clone());
    config.limit = Some(3);
    let summary = run_export(config);

    // urls capped at 3, events capped at 3, empty_table has 0
    assert_eq!(summary.rows_written, 6);
    let urls_csv = fs::read_to_string(out.join("History_urls.csv")).unwrap();
    assert_eq!(urls_csv.lines().count(), 4);
}

#[test]
fn test_small_batches_produce_same_output() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);

    let out_big = dir.path().join("big");
    let out_small = dir.path().join("small");

    run_export(config_for(InputSource::File(db.clone()), out_big.clone()));
    let mut config = config_for(InputSource::File(db), out_small.clone());
    config.batch_size = 100; // smallest allowed batch size
    run_export(config);

    let a = fs::read(out_big.join("History_urls.csv")).unwrap();
    let b = fs::read(out_small.join("History_urls.csv")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);

    let out1 = dir.path().join("run1");
    let out2 = dir.path().join("run2");
    run_export(config_for(InputSource::File(db.clone()), out1.clone()));
    run_export(config_for(InputSource::File(db), out2.clone()));

    for name in ["History_urls.csv", "History_events.csv", "History_empty_table.csv"] {
        let a = fs::read(out1.join(name)).unwrap();
        let b = fs::read(out2.join(name)).unwrap();
        assert_eq!(a, b, "output differs across runs for {name}");
    }
}

#[test]
fn test_folder_with_invalid_file_records_one_skipped_unit() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("evidence");
    fs::create_dir(&input).unwrap();

    create_history_db(&input.join("valid.db"));
    fs::write(input.join("fake.db"), b"definitely not a sqlite database").unwrap();

    let out = dir.path().join("exports");
    let summary = run_export(config_for(
        InputSource::Folder {
            path: input,
            recursive: false,
        },
        out.clone(),
    ));

    assert_eq!(summary.databases_processed, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.error_count(), 1);
    assert_eq!(summary.failures[0].kind, "NotASQLiteFileError");
    assert_eq!(summary.tables_exported, 3);

    // The failure is persisted in the error log
    let log = fs::read_to_string(out.join(ERROR_LOG_NAME)).unwrap();
    assert!(log.contains("NotASQLiteFileError"));
    assert!(log.contains("fake.db"));
}

#[test]
fn test_table_filter_with_missing_name_is_not_fatal() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);
    let out = dir.path().join("exports");

    let mut config = config_for(InputSource::File(db), out.clone());
    config.tables = Some(vec!["urls".into(), "no_such_table".into()]);
    let summary = run_export(config);

    // The missing name is a warning, not a failure; urls still exports
    assert_eq!(summary.error_count(), 0);
    assert_eq!(summary.tables_exported, 1);
    assert!(out.join("History_urls.csv").exists());
    assert!(!out.join("History_events.csv").exists());
}

#[test]
fn test_out_of_range_timestamp_yields_marker_not_abort() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);

    // One row with a value far outside the Webkit range
    let conn = Connection::open(&db).unwrap();
    conn.execute(
        "INSERT INTO urls (url, title, last_visit_time, visit_count)
         VALUES ('https://odd', 'Odd', 7, 1)",
        [],
    )
    .unwrap();
    drop(conn);

    let out = dir.path().join("exports");
    let summary = run_export(config_for(InputSource::File(db), out.clone()));

    assert_eq!(summary.error_count(), 0);
    assert_eq!(summary.conversion_failures, 1);

    let urls_csv = fs::read_to_string(out.join("History_urls.csv")).unwrap();
    assert_eq!(urls_csv.lines().count(), 12); // header + 11 rows, none dropped
    let odd_line = urls_csv.lines().find(|l| l.contains("https://odd")).unwrap();
    assert!(odd_line.ends_with(",,invalid"));
}

#[test]
fn test_null_timestamps_export_as_empty_cells() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);

    let conn = Connection::open(&db).unwrap();
    conn.execute(
        "INSERT INTO urls (url, title, last_visit_time, visit_count)
         VALUES ('https://nulled', 'N', NULL, 1)",
        [],
    )
    .unwrap();
    drop(conn);

    let out = dir.path().join("exports");
    let summary = run_export(config_for(InputSource::File(db), out.clone()));
    assert_eq!(summary.conversion_failures, 0);

    let urls_csv = fs::read_to_string(out.join("History_urls.csv")).unwrap();
    let line = urls_csv.lines().find(|l| l.contains("https://nulled")).unwrap();
    assert!(line.ends_with(",1,,"));
}

#[test]
fn test_locked_database_exports_via_temporary_copy() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("History.db");
    create_history_db(&db);

    // Hold an exclusive write transaction for the whole run
    let locker = Connection::open(&db).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let out = dir.path().join("exports");
    let summary = run_export(config_for(InputSource::File(db), out.clone()));

    assert_eq!(summary.error_count(), 0);
    assert_eq!(summary.tables_exported, 3);
    assert!(out.join("History_urls.csv").exists());

    locker.execute_batch("ROLLBACK").unwrap();
}

#[test]
fn test_blob_and_quoting_survive_round_trip() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("data.db");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, raw BLOB)")
        .unwrap();
    conn.execute(
        "INSERT INTO notes (body, raw) VALUES (?1, ?2)",
        rusqlite::params!["line one\nwith \"quotes\", commas", vec![0xca_u8, 0xfe]],
    )
    .unwrap();
    drop(conn);

    let out = dir.path().join("exports");
    run_export(config_for(InputSource::File(db), out.clone()));

    let csv = fs::read_to_string(out.join("data_notes.csv")).unwrap();
    assert!(csv.contains("\"line one\nwith \"\"quotes\"\", commas\""));
    assert!(csv.contains("cafe"));
}
