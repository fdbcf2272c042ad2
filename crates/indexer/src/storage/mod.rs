//! Persistence layer for the indexer.
//!
//! Two independent stores survive a restart:
//! - the checkpoint (last fully processed block), a single decimal integer
//! - the lifetime stats document, pretty-printed JSON keyed by token name
//!
//! Both are exposed as traits so the sync engine can run against the
//! file-backed stores in production and the in-memory ones in tests. File
//! writes go through a temp file in the same directory followed by a rename,
//! so a crash mid-write leaves the previous contents in place.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use flowstat_core::StatsMap;

pub mod checkpoint;
pub mod memory;
pub mod stats;

pub use checkpoint::{resume, FileCheckpointStore};
pub use memory::{MemoryCheckpointStore, MemoryStatsStore};
pub use stats::FileStatsStore;

/// Errors raised by the persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file exists but its contents cannot be parsed.
    #[error("Corrupt state in {}: {reason}", .path.display())]
    Corrupt {
        /// File being read.
        path: PathBuf,
        /// What failed to parse.
        reason: String,
    },

    /// The stats map could not be serialized.
    #[error("Failed to serialize stats: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A commit would move the checkpoint backwards.
    #[error("Checkpoint regression: stored block {current}, attempted {attempted}")]
    CheckpointRegression {
        /// Currently persisted block.
        current: u64,
        /// Rejected block.
        attempted: u64,
    },
}

/// Result type alias for StorageError.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Last fully processed block.
pub trait CheckpointStore: Send + Sync {
    /// Load the persisted checkpoint.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet and
    /// `Err(StorageError::Corrupt)` when something was persisted but is unreadable.
    fn load(&self) -> Result<Option<u64>>;

    /// Persist `block` as the new checkpoint.
    ///
    /// Fails with `StorageError::CheckpointRegression` if `block` is lower
    /// than the readable persisted value.
    fn commit(&self, block: u64) -> Result<()>;
}

/// Lifetime stats per token.
pub trait StatsStore: Send + Sync {
    /// Load the full stats map; empty when nothing has been persisted yet.
    fn load(&self) -> Result<StatsMap>;

    /// Overwrite the persisted stats with `stats`.
    fn save(&self, stats: &StatsMap) -> Result<()>;
}

/// Read a state file, mapping "not found" to `None`.
fn read_state_file(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == ErrorKind::InvalidData => Err(StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        Err(source) => Err(StorageError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replace `path` with `contents` via a sibling temp file and rename.
fn write_state_file(path: &Path, contents: &[u8]) -> Result<()> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}
