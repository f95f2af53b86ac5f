//! Database access layer
//!
//! Read-only access to source SQLite databases:
//! - `handle`: working handles with a temporary-copy fallback for locked files
//! - `schema`: table enumeration and column listing
//! - `reader`: memory-bounded batched row streaming

pub mod handle;
pub mod reader;
pub mod schema;

pub use handle::WorkingHandle;
pub use reader::{sample_rows, stream_batches, ReadOptions, Row, Value};
pub use schema::{list_tables, table_descriptor, TableDescriptor};
