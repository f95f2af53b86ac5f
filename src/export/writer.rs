//! CSV export writer
//!
//! Writes one CSV file per exported table: a header of the original column
//! names followed by, for each detected timestamp column, derived
//! `<column>_converted` and `<column>_type` headers. Values are quoted
//! RFC-4180 style by the csv crate; blobs render as hex so the output
//! stays printable.
//!
//! The writer flushes on every exit path, so a table whose stream aborts
//! partway still leaves a valid CSV holding the rows written so far.

use crate::db::reader::{Row, Value};
use crate::db::schema::TableDescriptor;
use crate::error::WriteError;
use crate::timestamp::{format_datetime, TimestampHypothesis};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Marker written to the `<column>_type` cell when a classified value
/// fails conversion (out of range or non-numeric)
const INVALID_MARKER: &str = "invalid";

/// Streams rows of one table into a CSV file
pub struct CsvTableWriter {
    wtr: csv::Writer<File>,
    path: PathBuf,
    hypotheses: Vec<TimestampHypothesis>,
    rows_written: u64,
    conversion_failures: u64,
}

impl CsvTableWriter {
    /// Create the output file and write the header row.
    pub fn create(
        path: &Path,
        descriptor: &TableDescriptor,
        hypotheses: &[TimestampHypothesis],
    ) -> Result<Self, WriteError> {
        let wtr = csv::Writer::from_path(path).map_err(|e| WriteError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut writer = Self {
            wtr,
            path: path.to_path_buf(),
            hypotheses: hypotheses.to_vec(),
            rows_written: 0,
            conversion_failures: 0,
        };

        let mut header: Vec<String> = descriptor.columns.clone();
        for hyp in &writer.hypotheses {
            let col = &descriptor.columns[hyp.column];
            header.push(format!("{col}_converted"));
            header.push(format!("{col}_type"));
        }
        writer.wtr.write_record(&header)?;

        Ok(writer)
    }

    /// Append a batch of rows, original values first, then one
    /// (converted, type) pair per detected timestamp column.
    pub fn write_batch(&mut self, rows: &[Row]) -> Result<(), WriteError> {
        for row in rows {
            let mut record: Vec<String> = row.iter().map(render_value).collect();

            for hyp in &self.hypotheses {
                match row.get(hyp.column) {
                    Some(value) if value.is_null() => {
                        // NULL passes through as an empty pair, not a failure
                        record.push(String::new());
                        record.push(String::new());
                    }
                    Some(value) => match hyp.scheme.convert(value) {
                        Some(dt) => {
                            record.push(format_datetime(&dt));
                            record.push(hyp.scheme.label().to_string());
                        }
                        None => {
                            record.push(String::new());
                            record.push(INVALID_MARKER.to_string());
                            self.conversion_failures += 1;
                        }
                    },
                    None => {
                        record.push(String::new());
                        record.push(String::new());
                    }
                }
            }

            self.wtr.write_record(&record)?;
            self.rows_written += 1;
        }
        Ok(())
    }

    /// Flush buffered output without consuming the writer.
    ///
    /// Called on the error path so a partial export is preserved.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.wtr.flush()?;
        Ok(())
    }

    /// Flush and finalize, returning (rows written, conversion failures).
    pub fn finish(mut self) -> Result<(u64, u64), WriteError> {
        self.wtr.flush()?;
        Ok((self.rows_written, self.conversion_failures))
    }

    /// Rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Per-value conversion failures so far
    pub fn conversion_failures(&self) -> u64 {
        self.conversion_failures
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render a cell for CSV output. Blobs become hex; NULL becomes empty.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(t) => t.clone(),
        Value::Blob(b) => hex::encode(b),
    }
}
