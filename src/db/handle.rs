//! Locked-file access: read-only working handles over source databases
//!
//! Forensic sources are frequently held open by the application that owns
//! them (a running browser keeps an exclusive lock on its history file).
//! [`WorkingHandle::acquire`] opens the database read-only and, when the
//! direct open fails with a lock/busy condition, transparently copies the
//! file into a temporary directory and opens the copy instead. The handle
//! owns that temporary directory, so the copy is removed on every exit
//! path when the handle is dropped.

use crate::discover::SQLITE_MAGIC;
use crate::error::{OpenError, OpenResult};
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// An open, read-only connection to a source database, possibly backed by
/// a temporary copy of the original file.
#[derive(Debug)]
pub struct WorkingHandle {
    conn: Connection,
    /// Path of the original source file (for naming and diagnostics)
    source_path: PathBuf,
    /// Path actually opened (the copy when one was made)
    opened_path: PathBuf,
    /// Owns the temporary copy, if any; dropped with the handle
    _temp: Option<TempDir>,
}

impl WorkingHandle {
    /// Acquire a read-only handle on `path`.
    ///
    /// Fails with [`OpenError::NotASqliteFile`] before any copy attempt if
    /// the file is missing, shorter than the 16-byte header, or does not
    /// carry the SQLite signature. Copying garbage wastes I/O and produces
    /// confusing downstream errors.
    pub fn acquire(path: &Path) -> OpenResult<Self> {
        validate_sqlite_file(path)?;

        match open_read_only(path) {
            Ok(conn) => Ok(Self {
                conn,
                source_path: path.to_path_buf(),
                opened_path: path.to_path_buf(),
                _temp: None,
            }),
            Err(e) if is_lock_error(&e) => {
                info!("Database locked, exporting from temporary copy: {}", path.display());
                Self::acquire_via_copy(path)
            }
            Err(e) => Err(OpenError::Sqlite(e)),
        }
    }

    fn acquire_via_copy(path: &Path) -> OpenResult<Self> {
        let temp = TempDir::new().map_err(|e| OpenError::CopyFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let file_name = path.file_name().unwrap_or_else(|| "database.db".as_ref());
        let copy_path = temp.path().join(file_name);

        fs::copy(path, &copy_path).map_err(|e| OpenError::CopyFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let conn = open_read_only(&copy_path)?;
        debug!("Temporary copy at {}", copy_path.display());

        Ok(Self {
            conn,
            source_path: path.to_path_buf(),
            opened_path: copy_path,
            _temp: Some(temp),
        })
    }

    /// The underlying read-only connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Path of the original source file
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Path actually opened (differs from the source when a copy was made)
    pub fn opened_path(&self) -> &Path {
        &self.opened_path
    }

    /// True when this handle reads from a temporary copy
    pub fn is_temp_copy(&self) -> bool {
        self._temp.is_some()
    }
}

/// Open a connection read-only and force a real read of the file.
///
/// SQLite opens lazily, so `Connection::open` succeeds even when another
/// process holds an exclusive lock; the busy error only surfaces on the
/// first page read. The schema-version pragma forces that read here, where
/// the copy fallback can still kick in.
fn open_read_only(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.query_row("PRAGMA schema_version", [], |_| Ok(()))?;
    Ok(conn)
}

/// Structural validation: exists, at least one header's worth of bytes,
/// and starts with the SQLite magic string.
fn validate_sqlite_file(path: &Path) -> OpenResult<()> {
    let not_a_db = || OpenError::NotASqliteFile {
        path: path.to_path_buf(),
    };

    let meta = fs::metadata(path).map_err(|_| not_a_db())?;
    if !meta.is_file() || meta.len() < SQLITE_MAGIC.len() as u64 {
        return Err(not_a_db());
    }

    let mut header = [0u8; 16];
    let mut file = fs::File::open(path)?;
    file.read_exact(&mut header)?;
    if &header != SQLITE_MAGIC {
        return Err(not_a_db());
    }

    Ok(())
}

/// Check whether an open/read failure is a lock/busy condition worth
/// retrying via the temporary-copy strategy.
fn is_lock_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
