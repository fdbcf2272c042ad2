//! Core types for flowstat.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A tracked fungible-token contract.
///
/// Tokens are loaded once from configuration and never change while the
/// process runs. `name` is the key under which lifetime stats are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Display name, unique across the registry.
    pub name: String,

    /// Contract address emitting `Transfer` logs.
    pub address: Address,

    /// Power-of-ten divisor exponent for human-readable amounts.
    pub decimals: u8,
}

impl Token {
    /// Create a new token entry.
    pub fn new(name: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            name: name.into(),
            address,
            decimals,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// A decoded ERC-20 transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferEvent {
    /// Sender (first indexed topic).
    pub from: Address,

    /// Recipient (second indexed topic).
    pub to: Address,

    /// Raw on-chain amount, before decimal scaling.
    pub value: U256,
}

impl TransferEvent {
    /// Create a new transfer event.
    pub const fn new(from: Address, to: Address, value: U256) -> Self {
        Self { from, to, value }
    }
}

/// Lifetime statistics for one token.
///
/// Every field only ever grows. The serialized shape is the persisted stats
/// document entry: `transfers` as an integer and the three volumes as exact
/// JSON numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeStats {
    /// Outgoing plus incoming transfers (fee payments are not counted).
    pub transfers: u64,

    /// Human-scale volume received by the tracked account.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub incoming: Decimal,

    /// Human-scale volume sent by the tracked account, fees excluded.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub outgoing: Decimal,

    /// Human-scale volume paid to the fee collector.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub fees: Decimal,
}

impl LifetimeStats {
    // Volumes saturate at Decimal::MAX instead of panicking; counts never wrap.

    /// Record a fee payment. The transfer count is left unchanged.
    pub fn record_fee(&mut self, amount: Decimal) {
        self.fees = self.fees.saturating_add(amount);
    }

    /// Record an outgoing transfer.
    pub fn record_outgoing(&mut self, amount: Decimal) {
        self.outgoing = self.outgoing.saturating_add(amount);
        self.transfers = self.transfers.saturating_add(1);
    }

    /// Record an incoming transfer.
    pub fn record_incoming(&mut self, amount: Decimal) {
        self.incoming = self.incoming.saturating_add(amount);
        self.transfers = self.transfers.saturating_add(1);
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.transfers == 0
            && self.incoming.is_zero()
            && self.outgoing.is_zero()
            && self.fees.is_zero()
    }
}

/// Lifetime statistics keyed by token display name.
pub type StatsMap = BTreeMap<String, LifetimeStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fee_keeps_transfer_count() {
        let mut stats = LifetimeStats::default();
        stats.record_fee(Decimal::new(25, 1));

        assert_eq!(stats.transfers, 0);
        assert_eq!(stats.fees, Decimal::new(25, 1));
        assert!(stats.outgoing.is_zero());
        assert!(!stats.is_empty());
    }

    #[test]
    fn test_record_outgoing_and_incoming() {
        let mut stats = LifetimeStats::default();
        stats.record_outgoing(Decimal::from(3));
        stats.record_incoming(Decimal::from(7));

        assert_eq!(stats.transfers, 2);
        assert_eq!(stats.outgoing, Decimal::from(3));
        assert_eq!(stats.incoming, Decimal::from(7));
    }

    #[test]
    fn test_stats_json_shape() {
        let stats = LifetimeStats {
            transfers: 4,
            incoming: Decimal::new(1_500_000, 6),
            outgoing: Decimal::from(2),
            fees: Decimal::new(1, 2),
        };

        let json = serde_json::to_string(&stats).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["transfers"].is_u64());
        assert!(value["incoming"].is_number());
        assert!(value["outgoing"].is_number());
        assert!(value["fees"].is_number());

        let back: LifetimeStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_stats_reads_float_document() {
        let json = r#"{"transfers": 3, "incoming": 12.5, "outgoing": 0, "fees": 0.25}"#;
        let stats: LifetimeStats = serde_json::from_str(json).unwrap();

        assert_eq!(stats.transfers, 3);
        assert_eq!(stats.incoming, Decimal::new(125, 1));
        assert!(stats.outgoing.is_zero());
        assert_eq!(stats.fees, Decimal::new(25, 2));
    }

    #[test]
    fn test_token_display() {
        let token = Token::new("pathUSD", Address::ZERO, 6);
        assert!(token.to_string().starts_with("pathUSD ("));
    }
}
