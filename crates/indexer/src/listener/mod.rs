//! Ledger access and the polling loop.
//!
//! This module provides:
//! - `Transfer` event definition and decoding
//! - The `Ledger` port and its alloy HTTP implementation
//! - The per-token range scanner
//! - The sync engine that drives one cycle per tick

pub mod events;
pub mod provider;
pub mod scanner;
pub mod sync;

pub use events::{decode_transfer, Transfer};
pub use provider::{Ledger, RpcLedger};
pub use scanner::{scan_token, ScanOutcome};
pub use sync::{CycleOutcome, CycleReport, IntervalTicker, SyncEngine, Ticker};
