//! # flowstat core
//!
//! Domain types and the pure accounting logic behind flowstat: classifying
//! ERC-20 transfers of a tracked account and folding them into per-token
//! lifetime statistics.
//!
//! ## Features
//!
//! - **Ethereum Types**: Alloy primitives for `Address` and `U256`
//! - **Domain Types**: `Token`, `TransferEvent`, `LifetimeStats`, `StatsMap`
//! - **Amounts**: exact raw-integer to human-scale `Decimal` conversion
//! - **Classification**: fee / outgoing / self-transfer / incoming decisions
//! - **Aggregation**: applying a batch of transfers to one token's stats
//! - **Metrics**: cross-token totals and the effective fee rate

#![warn(missing_docs)]

pub mod aggregate;
pub mod amount;
pub mod classifier;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod types;

// Re-export commonly used items
pub use aggregate::{aggregate, AggregateSummary};
pub use amount::to_human;
pub use classifier::{classify, Classification};
pub use constants::*;
pub use error::{CoreError, Result};
pub use metrics::GlobalMetrics;
pub use types::*;

// Re-export Alloy primitives and Decimal for convenience
pub use alloy_primitives::{Address, U256};
pub use rust_decimal::Decimal;
