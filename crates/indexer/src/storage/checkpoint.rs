//! Checkpoint storage: the last fully processed block number.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{read_state_file, write_state_file, CheckpointStore, Result, StorageError};

/// Checkpoint persisted as a decimal integer in a text file.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store backed by `path`. The file is created on first commit.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<u64>> {
        let Some(contents) = read_state_file(&self.path)? else {
            return Ok(None);
        };

        let trimmed = contents.trim();
        trimmed
            .parse::<u64>()
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                path: self.path.clone(),
                reason: format!("invalid block number {:?}: {}", trimmed, e),
            })
    }

    fn commit(&self, block: u64) -> Result<()> {
        match self.load() {
            Ok(Some(current)) if block < current => {
                return Err(StorageError::CheckpointRegression {
                    current,
                    attempted: block,
                });
            }
            // Unreadable previous contents are simply replaced.
            Ok(_) | Err(StorageError::Corrupt { .. }) => {}
            Err(e) => return Err(e),
        }

        write_state_file(&self.path, block.to_string().as_bytes())
    }
}

/// Decide the block to resume from.
///
/// Returns the persisted checkpoint when there is one. Otherwise falls back to
/// `latest - lookback` (saturating): silently on a first run, with a warning
/// when the checkpoint exists but is corrupt.
///
/// Any other I/O failure is returned and the cycle is skipped.
pub fn resume<C: CheckpointStore + ?Sized>(store: &C, latest: u64, lookback: u64) -> Result<u64> {
    let fallback = latest.saturating_sub(lookback);

    match store.load() {
        Ok(Some(block)) => Ok(block),
        Ok(None) => {
            info!(
                "No checkpoint found, starting {} blocks behind head at block {}",
                lookback, fallback
            );
            Ok(fallback)
        }
        Err(e @ StorageError::Corrupt { .. }) => {
            warn!("{}, falling back to block {}", e, fallback);
            Ok(fallback)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (FileCheckpointStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("last_block.txt"));
        (store, dir)
    }

    #[test]
    fn test_absent_checkpoint() {
        let (store, _dir) = setup_store();

        assert_eq!(store.load().unwrap(), None);
        assert_eq!(resume(&store, 1_000, 5).unwrap(), 995);
    }

    #[test]
    fn test_commit_and_resume() {
        let (store, _dir) = setup_store();

        store.commit(1_234).unwrap();

        assert_eq!(store.load().unwrap(), Some(1_234));
        assert_eq!(resume(&store, 2_000, 5).unwrap(), 1_234);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "1234");
    }

    #[test]
    fn test_tolerates_trailing_newline() {
        let (store, _dir) = setup_store();
        std::fs::write(store.path(), "42\n").unwrap();

        assert_eq!(store.load().unwrap(), Some(42));
    }

    #[test]
    fn test_corrupt_checkpoint_is_reported_and_falls_back() {
        let (store, _dir) = setup_store();
        std::fs::write(store.path(), "12ab").unwrap();

        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
        assert_eq!(resume(&store, 100, 5).unwrap(), 95);

        // A commit repairs the file.
        store.commit(100).unwrap();
        assert_eq!(store.load().unwrap(), Some(100));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_checkpoint_is_an_error() {
        let (store, dir) = setup_store();
        // A directory in place of the file cannot be read as text.
        std::fs::create_dir(dir.path().join("last_block.txt")).unwrap();

        assert!(matches!(
            resume(&store, 100, 5),
            Err(StorageError::Io { .. })
        ));
    }

    #[test]
    fn test_lookback_saturates_near_genesis() {
        let (store, _dir) = setup_store();
        assert_eq!(resume(&store, 3, 5).unwrap(), 0);
    }

    #[test]
    fn test_checkpoint_never_decreases() {
        let (store, _dir) = setup_store();

        let mut highest = 0;
        for block in [10u64, 10, 25, 7, 30, 29, 31] {
            match store.commit(block) {
                Ok(()) => {
                    assert!(block >= highest);
                    highest = block;
                }
                Err(StorageError::CheckpointRegression { current, attempted }) => {
                    assert_eq!(current, highest);
                    assert_eq!(attempted, block);
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
            assert_eq!(store.load().unwrap(), Some(highest));
        }
        assert_eq!(highest, 31);
    }
}
