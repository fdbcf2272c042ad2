//! Transfer polling and lifetime flow statistics for one tracked account.
//!
//! This crate provides:
//! - The `Ledger` port and its alloy JSON-RPC implementation
//! - Per-token `Transfer` log scanning over a block range
//! - File-backed checkpoint and stats stores
//! - The sync engine that runs one scan cycle per tick
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │  flowstat-indexer (this)         │
//! │                                  │
//! │  ┌─────────────────┐             │
//! │  │   Sync Engine   │ ← JSON-RPC  │
//! │  │  (tokio task)   │   eth_blockNumber
//! │  └────────┬────────┘   eth_getLogs
//! │           │                      │
//! │  ┌────────▼────────┐             │
//! │  │ flowstat-core   │             │
//! │  │ classify +      │             │
//! │  │ aggregate       │             │
//! │  └────────┬────────┘             │
//! │           │                      │
//! │  ┌────────▼────────┐             │
//! │  │    Storage      │             │
//! │  │ stats JSON,     │             │
//! │  │ then checkpoint │             │
//! │  └─────────────────┘             │
//! └──────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod listener;
pub mod storage;

#[cfg(test)]
mod testing;

pub use error::{IndexerError, Result};

// Re-export common types
pub use flowstat_core::{
    Address, Decimal, GlobalMetrics, LifetimeStats, StatsMap, Token, TransferEvent, U256,
};
