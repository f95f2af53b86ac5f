//! Streaming row reader
//!
//! Streams a table's rows in fixed-size batches so peak memory is bounded
//! by one batch regardless of table cardinality. The stream is forward-only
//! and not restartable; re-reading requires a fresh call. An optional row
//! limit stops the scan exactly at the limit (pushed down into the SQL, so
//! no over-fetching happens), and an optional interrupt flag is checked
//! between batches only, never mid-row.

use crate::db::schema::quote_ident;
use crate::error::{ReadError, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A single cell value, mapped from SQLite's storage classes.
///
/// A closed variant set so every consumer (CSV writer, timestamp
/// converter) pattern-matches exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// True for SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            // Tolerate invalid UTF-8 in text cells; forensic sources are
            // not always well-formed.
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// An ordered sequence of values aligned with the table's column order
pub type Row = Vec<Value>;

/// Options controlling one table scan
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Rows fetched per batch
    pub batch_size: usize,

    /// Stop after this many rows, if set
    pub limit: Option<u64>,
}

/// Fetch up to `count` leading rows of a table for heuristic sampling.
pub fn sample_rows(conn: &Connection, table: &str, count: usize) -> Result<Vec<Row>> {
    let mut samples = Vec::with_capacity(count);
    stream_batches(
        conn,
        table,
        &ReadOptions {
            batch_size: count.max(1),
            limit: Some(count as u64),
        },
        None,
        |batch| {
            samples.extend_from_slice(batch);
            Ok(())
        },
    )?;
    Ok(samples)
}

/// Stream a table's rows to `on_batch` in fixed-size batches.
///
/// Returns the number of rows produced. A row-level read failure aborts
/// this table's stream with [`ReadError::RowRead`] carrying the count of
/// rows already handed to `on_batch`; rows written before the failure are
/// preserved by the caller.
pub fn stream_batches<F>(
    conn: &Connection,
    table: &str,
    opts: &ReadOptions,
    interrupt: Option<&AtomicBool>,
    mut on_batch: F,
) -> Result<u64>
where
    F: FnMut(&[Row]) -> Result<()>,
{
    let sql = match opts.limit {
        Some(limit) => format!("SELECT * FROM {} LIMIT {}", quote_ident(table), limit),
        None => format!("SELECT * FROM {}", quote_ident(table)),
    };

    let query_err = |e: rusqlite::Error| ReadError::Query {
        table: table.to_string(),
        source: e,
    };

    let mut stmt = conn.prepare(&sql).map_err(query_err)?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query([]).map_err(query_err)?;

    let mut produced: u64 = 0;
    let mut batch: Vec<Row> = Vec::with_capacity(opts.batch_size);

    loop {
        let row_err = |e: rusqlite::Error| ReadError::RowRead {
            table: table.to_string(),
            rows_produced: produced,
            source: e,
        };

        match rows.next().map_err(row_err)? {
            Some(row) => {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    let cell = row.get_ref(i).map_err(row_err)?;
                    values.push(Value::from(cell));
                }
                batch.push(values);

                if batch.len() >= opts.batch_size {
                    on_batch(&batch)?;
                    produced += batch.len() as u64;
                    batch.clear();

                    // Cancellation is only observed on batch boundaries;
                    // a partially exported batch is never torn mid-row.
                    if let Some(flag) = interrupt {
                        if flag.load(Ordering::SeqCst) {
                            return Err(crate::error::ExporterError::Interrupted);
                        }
                    }
                }
            }
            None => break,
        }
    }

    if !batch.is_empty() {
        on_batch(&batch)?;
        produced += batch.len() as u64;
    }

    debug!(table, rows = produced, "table scan complete");
    Ok(produced)
}
