//! ERC-20 `Transfer` event definition and decoding.

use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;
use anyhow::{Context, Result};

use flowstat_core::TransferEvent;

// Define the Transfer event using Alloy's sol! macro
sol! {
    /// Standard ERC-20 Transfer event
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(address indexed from, address indexed to, uint256 value);
}

/// Decode a raw log into a transfer.
///
/// `from` and `to` come from the first and second indexed topics, `value`
/// from the data payload. Logs whose topic0 is not the `Transfer` signature,
/// or that carry too few topics or a malformed payload, are rejected.
pub fn decode_transfer(log: &Log) -> Result<TransferEvent> {
    let decoded =
        Transfer::decode_log(log.as_ref(), true).context("Failed to decode Transfer event")?;

    Ok(TransferEvent::new(decoded.from, decoded.to, decoded.value))
}
