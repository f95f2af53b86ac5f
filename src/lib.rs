//! sqlite-exporter - Forensic SQLite-to-CSV Exporter
//!
//! A tool for extracting tabular data from SQLite database files into CSV,
//! with forensic-oriented enhancements: multi-epoch timestamp detection and
//! decoding, tolerant handling of locked/busy databases via temporary
//! copies, and memory-bounded streaming for large tables.
//!
//! # Features
//!
//! - **Timestamp Decoding**: Columns that look like timestamps are detected
//!   heuristically and decoded under Webkit/Chrome, Unix seconds, Unix
//!   milliseconds, and Apple Cocoa epoch schemes into extra CSV columns.
//!
//! - **Locked-File Tolerance**: Databases exclusively held by a running
//!   application are exported from a temporary copy that is cleaned up
//!   on every exit path.
//!
//! - **Memory Bounded**: Rows stream through in fixed-size batches, so
//!   peak memory is independent of table size.
//!
//! - **Failure Isolation**: One bad table (or file) never aborts the run;
//!   every failure lands in the summary and a persisted error log, and
//!   partially exported tables keep the rows written before the failure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Export Orchestrator                   │
//! │   per (file, table) unit, sequential, failure-isolated   │
//! └──────┬──────────────────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ WorkingHandle │──▶│ Table Enum + │──▶│ Streaming Reader │
//! │ (temp copy    │   │ column list  │   │ (batched rows)   │
//! │  if locked)   │   └──────────────┘   └────────┬─────────┘
//! └──────────────┘                                │
//!                       ┌────────────────────┐    │
//!                       │ Timestamp Heuristics│◀──┤ sampled rows
//!                       └─────────┬──────────┘    │
//!                                 ▼               ▼
//!                       ┌─────────────────────────────┐
//!                       │        CSV Writer           │
//!                       │ cols + <col>_converted/_type │
//!                       └─────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Export a Chrome history file (works while Chrome is running)
//! sqlite-exporter --file History --output ./exports
//!
//! # Scan a folder of evidence recursively, preview 100 rows per table
//! sqlite-exporter --folder /evidence --recursive --limit 100
//! ```

pub mod config;
pub mod db;
pub mod discover;
pub mod error;
pub mod export;
pub mod progress;
pub mod timestamp;

pub use config::{CliArgs, ExportConfig, InputSource};
pub use db::{Row, TableDescriptor, Value, WorkingHandle};
pub use error::{ExporterError, Result};
pub use export::{ExportRun, ExportSummary};
pub use timestamp::{TimestampHypothesis, TimestampScheme};
