//! Export orchestrator
//!
//! Drives the full pipeline for a resolved list of source files: acquire a
//! working handle (once per file, reused across its tables), enumerate
//! tables, apply the table filter, then stream each selected table through
//! timestamp classification into a CSV file.
//!
//! The unit of failure isolation is one (source file, table) pair. Any
//! failure is recorded in the summary and the persisted error log, and the
//! run proceeds with the next unit; a schema read failure abandons the rest
//! of that file's tables, nothing more.

use crate::config::ExportConfig;
use crate::db::reader::ReadOptions;
use crate::db::{list_tables, sample_rows, stream_batches, table_descriptor, WorkingHandle};
use crate::error::{ConfigError, ExporterError, OpenError, Result};
use crate::export::writer::CsvTableWriter;
use crate::progress::ProgressReporter;
use crate::timestamp::hypotheses;
use chrono::Utc;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// File name of the persisted error log inside the output directory
pub const ERROR_LOG_NAME: &str = "export_errors.log";

/// Characters outside `[A-Za-z0-9_.-]` are replaced in output file names
static SANITIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w.-]").expect("Invalid sanitize regex"));

/// One failed export unit, recorded in the summary and the error log
#[derive(Debug)]
pub struct UnitFailure {
    pub file: PathBuf,
    pub table: Option<String>,
    pub kind: &'static str,
    pub message: String,
}

/// Aggregate counters for one export run
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Source files fully processed (all selected tables attempted)
    pub databases_processed: u64,

    /// Inputs skipped because they are not SQLite databases
    pub files_skipped: u64,

    /// Tables exported without error
    pub tables_exported: u64,

    /// Data rows written across all CSV files (partial tables included)
    pub rows_written: u64,

    /// Per-value timestamp conversion failures (never fatal)
    pub conversion_failures: u64,

    /// Total bytes of CSV output
    pub csv_bytes: u64,

    /// True when the run was stopped by a signal
    pub interrupted: bool,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Every failed unit, in discovery order
    pub failures: Vec<UnitFailure>,
}

impl ExportSummary {
    /// Number of failed units
    pub fn error_count(&self) -> u64 {
        self.failures.len() as u64
    }
}

/// Persisted error log, appended across the run and never truncated
/// mid-run. Flushed after every record so a crash loses nothing.
pub struct ErrorLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ErrorLog {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn record(&mut self, failure: &UnitFailure) -> std::io::Result<()> {
        let table = failure.table.as_deref().unwrap_or("-");
        writeln!(
            self.writer,
            "{} ERROR {} file='{}' table='{}' {}",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            failure.kind,
            failure.file.display(),
            table,
            failure.message,
        )?;
        self.writer.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Shared per-run state passed down the pipeline: summary counters plus
/// the persisted error log. Created at run start, finalized at the end;
/// no ambient globals.
struct RunContext {
    summary: ExportSummary,
    error_log: ErrorLog,
}

impl RunContext {
    fn record_failure(&mut self, file: &Path, table: Option<&str>, err: &ExporterError) {
        let failure = UnitFailure {
            file: file.to_path_buf(),
            table: table.map(str::to_string),
            kind: err.kind(),
            message: err.to_string(),
        };
        warn!(
            "{}: {} (file: {}, table: {})",
            failure.kind,
            failure.message,
            file.display(),
            failure.table.as_deref().unwrap_or("-"),
        );
        if let Err(log_err) = self.error_log.record(&failure) {
            warn!("Could not append to error log: {}", log_err);
        }
        self.summary.failures.push(failure);
    }
}

/// Allocates collision-safe CSV file names within one run.
///
/// Distinct (database, table) units that sanitize to the same name get a
/// numeric suffix so they never overwrite each other.
struct FileNamer {
    used: HashSet<String>,
}

impl FileNamer {
    fn new() -> Self {
        Self {
            used: HashSet::new(),
        }
    }

    fn csv_name(&mut self, db_path: &Path, table: &str) -> String {
        let stem = db_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("database");
        let base = format!(
            "{}_{}",
            SANITIZE_RE.replace_all(stem, "_"),
            SANITIZE_RE.replace_all(table, "_")
        );

        let mut name = format!("{base}.csv");
        let mut suffix = 2;
        while !self.used.insert(name.clone()) {
            name = format!("{base}_{suffix}.csv");
            suffix += 1;
        }
        name
    }
}

/// Top-level export driver for one run
pub struct ExportRun {
    config: ExportConfig,
    shutdown: Arc<AtomicBool>,
}

impl ExportRun {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between batches; set from the signal handler
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Process every source file in discovery order and aggregate a
    /// summary. Unit failures are recorded, never propagated; only
    /// run-level setup problems (unusable output directory) error out.
    pub fn run(
        &self,
        sources: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<ExportSummary> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            ExporterError::Config(ConfigError::InvalidOutputDir {
                path: self.config.output_dir.clone(),
                reason: e.to_string(),
            })
        })?;

        let error_log = ErrorLog::create(&self.config.output_dir.join(ERROR_LOG_NAME))?;
        let mut ctx = RunContext {
            summary: ExportSummary::default(),
            error_log,
        };
        let mut namer = FileNamer::new();

        info!("Exporting {} source file(s)", sources.len());

        'files: for source in sources {
            if self.shutdown.load(Ordering::SeqCst) {
                ctx.summary.interrupted = true;
                break;
            }

            if let Some(p) = progress {
                p.set_status(format!("Opening {}", source.display()));
            }

            let handle = match WorkingHandle::acquire(source) {
                Ok(h) => h,
                Err(e) => {
                    if matches!(e, OpenError::NotASqliteFile { .. }) {
                        ctx.summary.files_skipped += 1;
                    }
                    ctx.record_failure(source, None, &ExporterError::Open(e));
                    continue;
                }
            };
            if handle.is_temp_copy() {
                debug!("Reading {} via temporary copy", source.display());
            }

            let tables = match list_tables(handle.conn()) {
                Ok(t) => t,
                Err(e) => {
                    ctx.record_failure(source, None, &ExporterError::Schema(e));
                    continue;
                }
            };

            let selected = self.select_tables(source, &tables);

            for table in &selected {
                if let Some(p) = progress {
                    p.set_status(format!("{} \u{203a} {}", source.display(), table));
                }

                match self.export_table(&handle, table, &mut namer, &mut ctx.summary) {
                    Ok(()) => {}
                    Err(ExporterError::Interrupted) => {
                        ctx.summary.interrupted = true;
                        break 'files;
                    }
                    Err(err @ ExporterError::Schema(_)) => {
                        // Schema catalog trouble dooms this file's
                        // remaining tables too
                        ctx.record_failure(source, Some(table.as_str()), &err);
                        break;
                    }
                    Err(err) => {
                        ctx.record_failure(source, Some(table.as_str()), &err);
                    }
                }
            }

            ctx.summary.databases_processed += 1;
        }

        ctx.summary.duration = start.elapsed();
        if ctx.summary.interrupted {
            info!("Export interrupted; partial output preserved");
        }
        Ok(ctx.summary)
    }

    /// Intersect the schema's tables with the configured filter. Filter
    /// names absent from the schema get a warning, not a failure.
    fn select_tables(&self, source: &Path, tables: &[String]) -> Vec<String> {
        match &self.config.tables {
            None => tables.to_vec(),
            Some(filter) => {
                for wanted in filter {
                    if !tables.iter().any(|t| t == wanted) {
                        warn!(
                            "Table '{}' not found in {} - skipping",
                            wanted,
                            source.display()
                        );
                    }
                }
                tables
                    .iter()
                    .filter(|t| filter.iter().any(|w| w == *t))
                    .cloned()
                    .collect()
            }
        }
    }

    /// Export one table: sample, classify, stream, write.
    ///
    /// Counters for rows already written are folded into the summary even
    /// when the stream aborts, and the CSV file is flushed on every path.
    fn export_table(
        &self,
        handle: &WorkingHandle,
        table: &str,
        namer: &mut FileNamer,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let conn = handle.conn();
        let descriptor = table_descriptor(conn, table)?;
        let samples = sample_rows(conn, table, self.config.sample_rows)?;
        let hyps = hypotheses(&descriptor, &samples);

        for hyp in &hyps {
            debug!(
                table,
                column = descriptor.columns[hyp.column].as_str(),
                scheme = hyp.scheme.label(),
                "detected timestamp column"
            );
        }

        let csv_path = self
            .config
            .output_dir
            .join(namer.csv_name(handle.source_path(), table));
        let mut writer = CsvTableWriter::create(&csv_path, &descriptor, &hyps)?;

        let opts = ReadOptions {
            batch_size: self.config.batch_size,
            limit: self.config.limit,
        };

        let stream_result = stream_batches(conn, table, &opts, Some(self.shutdown.as_ref()), |batch| {
            writer.write_batch(batch).map_err(Into::into)
        });

        match stream_result {
            Ok(rows) => {
                summary.rows_written += rows;
                summary.conversion_failures += writer.conversion_failures();
                writer.finish()?;
                summary.tables_exported += 1;
                if let Ok(meta) = fs::metadata(&csv_path) {
                    summary.csv_bytes += meta.len();
                }
                info!(
                    "Exported {} rows from table '{}' to {}",
                    rows,
                    table,
                    csv_path.display()
                );
                Ok(())
            }
            Err(e) => {
                // Preserve whatever made it out before the failure
                summary.rows_written += writer.rows_written();
                summary.conversion_failures += writer.conversion_failures();
                if let Err(flush_err) = writer.flush() {
                    warn!("Could not flush partial CSV: {}", flush_err);
                }
                if let Ok(meta) = fs::metadata(&csv_path) {
                    summary.csv_bytes += meta.len();
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_namer_sanitizes() {
        let mut namer = FileNamer::new();
        let name = namer.csv_name(Path::new("/data/my profile/History"), "urls");
        assert_eq!(name, "History_urls.csv");

        let odd = namer.csv_name(Path::new("/data/a b.db"), "weird table!");
        assert_eq!(odd, "a_b_weird_table_.csv");
    }

    #[test]
    fn test_file_namer_avoids_collisions() {
        let mut namer = FileNamer::new();
        let first = namer.csv_name(Path::new("x/History"), "urls");
        let second = namer.csv_name(Path::new("y/History"), "urls");
        let third = namer.csv_name(Path::new("z/History"), "urls");
        assert_eq!(first, "History_urls.csv");
        assert_eq!(second, "History_urls_2.csv");
        assert_eq!(third, "History_urls_3.csv");
    }

    #[test]
    fn test_error_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join(ERROR_LOG_NAME);

        let mut log = ErrorLog::create(&log_path).unwrap();
        log.record(&UnitFailure {
            file: PathBuf::from("/evidence/History"),
            table: Some("urls".into()),
            kind: "RowReadError",
            message: "boom".into(),
        })
        .unwrap();
        drop(log);

        // A second run appends rather than truncating
        let mut log = ErrorLog::create(&log_path).unwrap();
        log.record(&UnitFailure {
            file: PathBuf::from("/evidence/other.db"),
            table: None,
            kind: "NotASQLiteFileError",
            message: "bad header".into(),
        })
        .unwrap();
        drop(log);

        let content = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("RowReadError"));
        assert!(lines[0].contains("table='urls'"));
        assert!(lines[1].contains("NotASQLiteFileError"));
        assert!(lines[1].contains("table='-'"));
    }

    #[test]
    fn test_summary_error_count() {
        let mut summary = ExportSummary::default();
        assert_eq!(summary.error_count(), 0);
        summary.failures.push(UnitFailure {
            file: PathBuf::from("a.db"),
            table: None,
            kind: "OpenError",
            message: "locked".into(),
        });
        assert_eq!(summary.error_count(), 1);
    }
}
