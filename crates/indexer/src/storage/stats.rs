//! Lifetime stats storage as a pretty-printed JSON document.

use std::path::{Path, PathBuf};

use flowstat_core::StatsMap;

use super::{read_state_file, write_state_file, Result, StatsStore, StorageError};

/// Stats map persisted as indented JSON keyed by token name.
///
/// ```json
/// {
///   "pathUSD": {
///     "transfers": 3,
///     "incoming": 12.5,
///     "outgoing": 4.25,
///     "fees": 0.01
///   }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    /// Create a store backed by `path`. The file is created on first save.
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

impl StatsStore for FileStatsStore {
    fn load(&self) -> Result<StatsMap> {
        let Some(contents) = read_state_file(&self.path)? else {
            return Ok(StatsMap::new());
        };

        serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, stats: &StatsMap) -> Result<()> {
        let json = serde_json::to_vec_pretty(stats)?;
        write_state_file(&self.path, &json)
    }
}
