//! In-memory stores.
//!
//! Clones share state, so a store handed to one engine can be inspected or
//! handed to a second engine to model a process restart.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flowstat_core::StatsMap;

use super::{CheckpointStore, Result, StatsStore, StorageError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Checkpoint held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    block: Arc<Mutex<Option<u64>>>,
}

impl MemoryCheckpointStore {
    /// Create an empty store (first run).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `block`.
    pub fn with_block(block: u64) -> Self {
        Self {
            block: Arc::new(Mutex::new(Some(block))),
        }
    }

    /// Current value, if any.
    pub fn get(&self) -> Option<u64> {
        *lock(&self.block)
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<u64>> {
        Ok(self.get())
    }

    fn commit(&self, block: u64) -> Result<()> {
        let mut current = lock(&self.block);
        if let Some(stored) = *current {
            if block < stored {
                return Err(StorageError::CheckpointRegression {
                    current: stored,
                    attempted: block,
                });
            }
        }
        *current = Some(block);
        Ok(())
    }
}

/// Stats map held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatsStore {
    stats: Arc<Mutex<Option<StatsMap>>>,
}

impl MemoryStatsStore {
    /// Create an empty store (first run).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `stats`.
    pub fn with_stats(stats: StatsMap) -> Self {
        Self {
            stats: Arc::new(Mutex::new(Some(stats))),
        }
    }

    /// Last saved map, or `None` if nothing was ever saved.
    pub fn snapshot(&self) -> Option<StatsMap> {
        lock(&self.stats).clone()
    }
}

impl StatsStore for MemoryStatsStore {
    fn load(&self) -> Result<StatsMap> {
        Ok(self.snapshot().unwrap_or_default())
    }

    fn save(&self, stats: &StatsMap) -> Result<()> {
        *lock(&self.stats) = Some(stats.clone());
        Ok(())
    }
}
