//! Configuration types for sqlite-exporter
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Batch size limits
const MIN_BATCH_SIZE: usize = 100;
const MAX_BATCH_SIZE: usize = 100_000;

/// Minimum rows sampled per table for timestamp classification
const MIN_SAMPLE_ROWS: usize = 1;

/// Forensic SQLite-to-CSV exporter
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sqlite-exporter",
    version,
    about = "Export SQLite databases to CSV with forensic timestamp decoding",
    long_about = "Exports every table of one or more SQLite databases to CSV files.\n\n\
                  Columns that look like timestamps (Webkit/Chrome, Unix seconds,\n\
                  Unix milliseconds, Apple Cocoa) are detected heuristically and\n\
                  decoded into extra <column>_converted / <column>_type columns.\n\
                  Locked databases are exported from a temporary copy.",
    after_help = "EXAMPLES:\n    \
        sqlite-exporter --file History\n    \
        sqlite-exporter --file places.sqlite --tables moz_places,moz_visits --limit 100\n    \
        sqlite-exporter --folder /evidence/profile --recursive --output /case/exports",
    group(ArgGroup::new("input").required(true).args(["file", "folder"]))
)]
pub struct CliArgs {
    /// Single SQLite database file to export
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Folder containing SQLite databases
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Include subfolders when using --folder
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Output directory for CSV files
    #[arg(short = 'o', long, default_value = "./sqlite_exports", value_name = "DIR")]
    pub output: PathBuf,

    /// Comma-separated list of specific tables to export
    #[arg(long, value_name = "NAMES")]
    pub tables: Option<String>,

    /// Limit number of rows exported per table
    #[arg(short = 'l', long, value_name = "NUM")]
    pub limit: Option<u64>,

    /// Rows fetched per batch while streaming a table
    #[arg(short = 'b', long, default_value = "1000", value_name = "NUM")]
    pub batch_size: usize,

    /// Rows sampled per table for timestamp classification
    #[arg(long, default_value = "50", value_name = "NUM")]
    pub sample_rows: usize,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-table detail)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Where source databases come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A single database file
    File(PathBuf),

    /// A folder scanned for database files
    Folder { path: PathBuf, recursive: bool },
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Input file or folder
    pub input: InputSource,

    /// Directory receiving one CSV per (database, table) pair
    pub output_dir: PathBuf,

    /// Optional table-name allowlist
    pub tables: Option<Vec<String>>,

    /// Optional per-table row limit
    pub limit: Option<u64>,

    /// Rows fetched per batch
    pub batch_size: usize,

    /// Rows sampled per table for classification
    pub sample_rows: usize,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl ExportConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let input = match (&args.file, &args.folder) {
            (Some(file), None) => {
                if !file.is_file() {
                    return Err(ConfigError::InvalidInput {
                        path: file.clone(),
                        reason: "File does not exist".into(),
                    });
                }
                InputSource::File(file.clone())
            }
            (None, Some(folder)) => {
                if !folder.is_dir() {
                    return Err(ConfigError::InvalidInput {
                        path: folder.clone(),
                        reason: "Folder does not exist".into(),
                    });
                }
                InputSource::Folder {
                    path: folder.clone(),
                    recursive: args.recursive,
                }
            }
            // clap's ArgGroup guarantees exactly one of --file/--folder
            _ => unreachable!("clap enforces exactly one input source"),
        };

        if args.batch_size < MIN_BATCH_SIZE || args.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize {
                size: args.batch_size,
                min: MIN_BATCH_SIZE,
                max: MAX_BATCH_SIZE,
            });
        }

        if args.sample_rows < MIN_SAMPLE_ROWS {
            return Err(ConfigError::InvalidSampleSize {
                size: args.sample_rows,
                min: MIN_SAMPLE_ROWS,
            });
        }

        // Refuse an output path that exists but is not a directory; a
        // missing directory is created at run start.
        if args.output.exists() && !args.output.is_dir() {
            return Err(ConfigError::InvalidOutputDir {
                path: args.output.clone(),
                reason: "Path exists and is not a directory".into(),
            });
        }

        let tables = args.tables.as_ref().map(|raw| {
            raw.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        });

        Ok(Self {
            input,
            output_dir: args.output,
            tables,
            limit: args.limit,
            batch_size: args.batch_size,
            sample_rows: args.sample_rows,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base_args(file: PathBuf) -> CliArgs {
        CliArgs {
            file: Some(file),
            folder: None,
            recursive: false,
            output: PathBuf::from("./sqlite_exports"),
            tables: None,
            limit: None,
            batch_size: 1000,
            sample_rows: 50,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_config_from_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");
        fs::write(&db, b"SQLite format 3\0").unwrap();

        let config = ExportConfig::from_args(base_args(db.clone())).unwrap();
        assert_eq!(config.input, InputSource::File(db));
        assert_eq!(config.batch_size, 1000);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = ExportConfig::from_args(base_args(PathBuf::from("/no/such/file.db")));
        assert!(matches!(err, Err(ConfigError::InvalidInput { .. })));
    }

    #[test]
    fn test_batch_size_validation() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");
        fs::write(&db, b"SQLite format 3\0").unwrap();

        let mut args = base_args(db);
        args.batch_size = 10;
        let err = ExportConfig::from_args(args);
        assert!(matches!(err, Err(ConfigError::InvalidBatchSize { .. })));
    }

    #[test]
    fn test_table_filter_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");
        fs::write(&db, b"SQLite format 3\0").unwrap();

        let mut args = base_args(db);
        args.tables = Some("urls, visits,,downloads ".into());
        let config = ExportConfig::from_args(args).unwrap();
        assert_eq!(
            config.tables,
            Some(vec!["urls".to_string(), "visits".into(), "downloads".into()])
        );
    }

    #[test]
    fn test_cli_parses() {
        use clap::Parser;
        let args =
            CliArgs::try_parse_from(["sqlite-exporter", "--file", "History", "--limit", "10"])
                .unwrap();
        assert_eq!(args.limit, Some(10));
        assert!(args.folder.is_none());
    }

    #[test]
    fn test_cli_requires_one_input() {
        use clap::Parser;
        assert!(CliArgs::try_parse_from(["sqlite-exporter"]).is_err());
        assert!(CliArgs::try_parse_from([
            "sqlite-exporter",
            "--file",
            "a.db",
            "--folder",
            "/tmp"
        ])
        .is_err());
    }
}
