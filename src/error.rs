//! Error types for sqlite-exporter
//!
//! This module defines a structured error hierarchy covering:
//! - Database open and locked-file fallback errors
//! - Schema catalog read errors
//! - Row streaming errors (with partial-progress context)
//! - CSV output errors
//! - Configuration and CLI errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors carry enough context (path, table, counts) to diagnose a
//!   failed export without re-running it
//! - Failures are isolated at the export-unit boundary; nothing at the
//!   row or value level propagates past its table

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the exporter
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Failed to open a source database
    #[error("Open error: {0}")]
    Open(#[from] OpenError),

    /// Failed to read the schema catalog
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Failed while streaming rows from a table
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Failed while writing CSV output
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interrupted by signal
    #[error("Export interrupted by signal")]
    Interrupted,
}

impl ExporterError {
    /// Short kind label used in the persisted error log and summary
    pub fn kind(&self) -> &'static str {
        match self {
            ExporterError::Open(e) => e.kind(),
            ExporterError::Schema(_) => "SchemaReadError",
            ExporterError::Read(_) => "RowReadError",
            ExporterError::Write(_) => "WriteError",
            ExporterError::Config(_) => "ConfigError",
            ExporterError::Io(_) => "IoError",
            ExporterError::Interrupted => "Interrupted",
        }
    }
}

/// Errors produced while acquiring a working handle on a source database
#[derive(Error, Debug)]
pub enum OpenError {
    /// Input is missing, empty, or does not carry the SQLite header
    #[error("Not a SQLite database: '{path}'")]
    NotASqliteFile { path: PathBuf },

    /// Direct open failed with a lock/busy condition and the temporary
    /// copy fallback also failed
    #[error("Database '{path}' is locked and could not be copied: {reason}")]
    CopyFailed { path: PathBuf, reason: String },

    /// SQLite-level open failure (permissions, malformed header page)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O failure while probing or copying the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpenError {
    pub fn kind(&self) -> &'static str {
        match self {
            OpenError::NotASqliteFile { .. } => "NotASQLiteFileError",
            _ => "OpenError",
        }
    }
}

/// Errors produced while reading the schema catalog
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The sqlite_master catalog could not be read
    #[error("Failed to read schema catalog: {0}")]
    Catalog(#[source] rusqlite::Error),

    /// Column listing for a table failed
    #[error("Failed to read columns of table '{table}': {source}")]
    Columns {
        table: String,
        source: rusqlite::Error,
    },
}

/// Errors produced while streaming rows from a table
#[derive(Error, Debug)]
pub enum ReadError {
    /// Failed to prepare or start the table scan
    #[error("Failed to start scan of table '{table}': {source}")]
    Query {
        table: String,
        source: rusqlite::Error,
    },

    /// A row fetch failed partway through the stream. Rows produced
    /// before the failure were already handed to the writer.
    #[error("Row read failed in table '{table}' after {rows_produced} rows: {source}")]
    RowRead {
        table: String,
        rows_produced: u64,
        source: rusqlite::Error,
    },
}

/// Errors produced while writing CSV output
#[derive(Error, Debug)]
pub enum WriteError {
    /// CSV serialization failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to create or flush the output file
    #[error("Failed to write '{path}': {reason}")]
    Output { path: PathBuf, reason: String },

    /// I/O error on the output file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid batch size
    #[error("Invalid batch size {size}: must be between {min} and {max}")]
    InvalidBatchSize { size: usize, min: usize, max: usize },

    /// Invalid sample size
    #[error("Invalid sample size {size}: must be at least {min}")]
    InvalidSampleSize { size: usize, min: usize },

    /// Input path error
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// Output path error
    #[error("Invalid output directory '{path}': {reason}")]
    InvalidOutputDir { path: PathBuf, reason: String },
}

/// Result type alias for ExporterError
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Result type alias for OpenError
pub type OpenResult<T> = std::result::Result<T, OpenError>;

/// Result type alias for SchemaError
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
