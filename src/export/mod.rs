//! Export pipeline
//!
//! - `writer`: CSV output with derived timestamp columns
//! - `orchestrator`: per-unit state machine, failure isolation, summary

pub mod orchestrator;
pub mod writer;

pub use orchestrator::{ErrorLog, ExportRun, ExportSummary, UnitFailure, ERROR_LOG_NAME};
pub use writer::CsvTableWriter;
