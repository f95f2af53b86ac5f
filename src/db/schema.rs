//! Table enumeration and column listing
//!
//! Reads the `sqlite_master` catalog for user table names (internal
//! `sqlite_%` bookkeeping tables are excluded) and `PRAGMA table_info`
//! for the ordered column list of each table.

use crate::error::{SchemaError, SchemaResult};
use rusqlite::Connection;

/// A table name plus its ordered column names as reported by the schema.
///
/// Column order is stable for the duration of one export; no concurrent
/// schema mutation is assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<String>,
}

/// List user tables in catalog order.
///
/// Zero tables is a valid empty result; a failure to read the catalog
/// itself is a [`SchemaError`].
pub fn list_tables(conn: &Connection) -> SchemaResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .map_err(SchemaError::Catalog)?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(SchemaError::Catalog)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(SchemaError::Catalog)?;

    Ok(names)
}

/// Read the ordered column list for a table.
pub fn table_descriptor(conn: &Connection, table: &str) -> SchemaResult<TableDescriptor> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql).map_err(|e| SchemaError::Columns {
        table: table.to_string(),
        source: e,
    })?;

    // table_info rows: (cid, name, type, notnull, dflt_value, pk)
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| SchemaError::Columns {
            table: table.to_string(),
            source: e,
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SchemaError::Columns {
            table: table.to_string(),
            source: e,
        })?;

    Ok(TableDescriptor {
        name: table.to_string(),
        columns,
    })
}

/// Quote an identifier for embedding in SQL text.
///
/// Table names come straight from the schema catalog, but quoting keeps
/// names with spaces, quotes, or keywords working.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
