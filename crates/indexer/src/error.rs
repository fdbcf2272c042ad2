//! Error taxonomy for the indexer.

use thiserror::Error;

use crate::storage::StorageError;

/// Failures surfaced by the ledger adapter and the sync engine.
///
/// Only `Connection` is fatal (startup). Everything else aborts the current
/// cycle without advancing the checkpoint; the loop retries on the next tick.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// The RPC endpoint could not be reached at startup.
    #[error("Failed to connect to RPC endpoint {url}: {reason:#}")]
    Connection {
        /// Endpoint URL.
        url: String,
        /// Underlying failure.
        reason: anyhow::Error,
    },

    /// The chain height could not be queried.
    #[error("Failed to query chain height: {0:#}")]
    HeightQuery(anyhow::Error),

    /// Fetching transfer logs for one token failed.
    #[error("Failed to fetch {token} transfer logs for blocks {from_block}..={to_block}: {reason:#}")]
    LogQuery {
        /// Token display name.
        token: String,
        /// First block of the range.
        from_block: u64,
        /// Last block of the range (inclusive).
        to_block: u64,
        /// Underlying failure.
        reason: anyhow::Error,
    },

    /// Reading or writing persisted state failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

impl IndexerError {
    /// Whether the process should stop instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Result type alias for IndexerError.
pub type Result<T> = std::result::Result<T, IndexerError>;
