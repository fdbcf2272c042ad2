//! Aggregation of classified transfers into lifetime statistics.

use alloy_primitives::Address;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::amount::to_human;
use crate::classifier::{classify, Classification};
use crate::types::{LifetimeStats, Token, TransferEvent};

/// Per-batch tally of how transfers were applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    /// Fee payments applied.
    pub fees: usize,
    /// Outgoing transfers applied.
    pub outgoing: usize,
    /// Self-transfers applied (as outgoing).
    pub self_transfers: usize,
    /// Incoming transfers applied.
    pub incoming: usize,
    /// Transfers not involving the tracked account.
    pub irrelevant: usize,
    /// Counted transfers dropped because the amount could not be scaled.
    pub unconvertible: usize,
}

impl AggregateSummary {
    /// Number of transfers that changed the stats.
    pub fn applied(&self) -> usize {
        self.fees + self.outgoing + self.self_transfers + self.incoming
    }

    fn tally(&mut self, decision: Classification) {
        match decision {
            Classification::Fee => self.fees += 1,
            Classification::Outgoing => self.outgoing += 1,
            Classification::SelfTransfer => self.self_transfers += 1,
            Classification::Incoming => self.incoming += 1,
            Classification::Irrelevant => self.irrelevant += 1,
        }
    }

    /// Add another summary into this one.
    pub fn merge(&mut self, other: &AggregateSummary) {
        self.fees += other.fees;
        self.outgoing += other.outgoing;
        self.self_transfers += other.self_transfers;
        self.incoming += other.incoming;
        self.irrelevant += other.irrelevant;
        self.unconvertible += other.unconvertible;
    }
}

/// Apply a batch of transfers for one token to that token's stats, in order.
///
/// `stats` is borrowed only for the duration of the call. Amounts are scaled
/// with [`to_human`] using the token's decimals; a transfer whose amount does
/// not fit is logged, counted in [`AggregateSummary::unconvertible`] and
/// skipped.
pub fn aggregate(
    stats: &mut LifetimeStats,
    token: &Token,
    events: &[TransferEvent],
    tracked: Address,
    fee_collector: Address,
) -> AggregateSummary {
    let mut summary = AggregateSummary::default();

    for event in events {
        let decision = classify(event, tracked, fee_collector);
        let record: fn(&mut LifetimeStats, Decimal) = match decision {
            Classification::Fee => LifetimeStats::record_fee,
            Classification::Outgoing | Classification::SelfTransfer => {
                LifetimeStats::record_outgoing
            }
            Classification::Incoming => LifetimeStats::record_incoming,
            Classification::Irrelevant => {
                summary.tally(decision);
                continue;
            }
        };

        match to_human(event.value, token.decimals) {
            Ok(amount) => {
                record(stats, amount);
                summary.tally(decision);
            }
            Err(e) => {
                warn!(token = %token.name, from = %event.from, to = %event.to, "Skipping transfer: {}", e);
                summary.unconvertible += 1;
            }
        }
    }

    debug!(
        token = %token.name,
        applied = summary.applied(),
        irrelevant = summary.irrelevant,
        unconvertible = summary.unconvertible,
        "Aggregated transfer batch"
    );

    summary
}
