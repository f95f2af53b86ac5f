//! Source file discovery
//!
//! Resolves the CLI input (single file or folder) into an ordered list of
//! candidate database paths. Folder scans match by well-known SQLite file
//! extensions, falling back to a header-signature probe for extension-less
//! files (browser profiles often ship databases named just `History`).

use crate::config::{ExportConfig, InputSource};
use crate::error::Result;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions commonly used for SQLite databases
const SQLITE_EXTENSIONS: &[&str] = &["sqlite", "db", "sqlite3", "db3", "s3db", "sl3"];

/// The 16-byte magic string at the start of every SQLite database file
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Check whether a file starts with the SQLite header signature.
///
/// Returns false for missing files, files shorter than the header, and
/// files we cannot read.
pub fn has_sqlite_header(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let mut header = [0u8; 16];
    match file.read_exact(&mut header) {
        Ok(()) => &header == SQLITE_MAGIC,
        Err(_) => false,
    }
}

/// Resolve the configured input into a concrete ordered list of source files.
///
/// A single-file input is passed through untouched; its validity is judged
/// later when the working handle is acquired, so an invalid file still shows
/// up in the summary as a skipped unit rather than vanishing silently.
pub fn resolve_sources(config: &ExportConfig) -> Result<Vec<PathBuf>> {
    match &config.input {
        InputSource::File(path) => Ok(vec![path.clone()]),
        InputSource::Folder { path, recursive } => Ok(find_sqlite_files(path, *recursive)),
    }
}

/// Find candidate SQLite files under a folder.
///
/// Entries are visited in sorted order so repeated runs discover files in
/// the same sequence.
pub fn find_sqlite_files(folder: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", folder.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if has_sqlite_extension(path) {
            found.push(path.to_path_buf());
        } else if has_sqlite_header(path) {
            debug!("Matched by header signature: {}", path.display());
            found.push(path.to_path_buf());
        }
    }

    found
}

fn has_sqlite_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SQLITE_EXTENSIONS.iter().any(|known| *known == e)
        })
        .unwrap_or(false)
}
