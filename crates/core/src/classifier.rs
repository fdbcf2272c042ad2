//! Transfer classification.
//!
//! Decides which lifetime bucket a transfer contributes to, from the point of
//! view of one tracked account and one fee-collector address.

use alloy_primitives::Address;

use crate::types::TransferEvent;

/// Accounting decision for a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Tracked account paid the fee collector: `fees += amount`.
    Fee,
    /// Tracked account sent to someone else: `outgoing += amount`, `transfers += 1`.
    Outgoing,
    /// Tracked account sent to itself. Counted exactly like `Outgoing`, once.
    SelfTransfer,
    /// Someone else sent to the tracked account: `incoming += amount`, `transfers += 1`.
    Incoming,
    /// Transfer does not involve the tracked account in a counted role.
    Irrelevant,
}

impl Classification {
    /// Whether this decision bumps the transfer count.
    pub const fn counts_as_transfer(self) -> bool {
        matches!(self, Self::Outgoing | Self::SelfTransfer | Self::Incoming)
    }
}

/// Classify a transfer for the tracked account.
///
/// Precedence:
/// 1. `to == fee_collector && from == tracked` → [`Classification::Fee`]; nothing else is checked.
/// 2. `from == tracked && to != fee_collector` → [`Classification::Outgoing`],
///    or [`Classification::SelfTransfer`] when `to == tracked`.
/// 3. `to == tracked && from != tracked` → [`Classification::Incoming`].
///
/// Rules 2 and 3 exclude each other (one needs `from == tracked`, the other
/// `from != tracked`), so a self-transfer is counted once, as outgoing.
///
/// # Example
///
/// ```
/// use flowstat_core::{classify, Address, Classification, TransferEvent, U256};
///
/// let me = Address::repeat_byte(0x01);
/// let fees = Address::repeat_byte(0xfe);
/// let event = TransferEvent::new(me, fees, U256::from(100u64));
///
/// assert_eq!(classify(&event, me, fees), Classification::Fee);
/// ```
pub fn classify(event: &TransferEvent, tracked: Address, fee_collector: Address) -> Classification {
    let from_tracked = event.from == tracked;
    let to_tracked = event.to == tracked;
    let to_fee_collector = event.to == fee_collector;

    match (from_tracked, to_tracked, to_fee_collector) {
        (true, _, true) => Classification::Fee,
        (true, true, false) => Classification::SelfTransfer,
        (true, false, false) => Classification::Outgoing,
        (false, true, _) => Classification::Incoming,
        (false, false, _) => Classification::Irrelevant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};

    const TRACKED: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const FEE: Address = address!("feec000000000000000000000000000000000000");
    const OTHER: Address = address!("1111111111111111111111111111111111111111");
    const ANOTHER: Address = address!("2222222222222222222222222222222222222222");

    fn event(from: Address, to: Address) -> TransferEvent {
        TransferEvent::new(from, to, U256::from(1_000u64))
    }

    #[test]
    fn test_fee_payment() {
        let decision = classify(&event(TRACKED, FEE), TRACKED, FEE);
        assert_eq!(decision, Classification::Fee);
        assert!(!decision.counts_as_transfer());
    }

    #[test]
    fn test_outgoing() {
        let decision = classify(&event(TRACKED, OTHER), TRACKED, FEE);
        assert_eq!(decision, Classification::Outgoing);
        assert!(decision.counts_as_transfer());
    }

    #[test]
    fn test_incoming() {
        let decision = classify(&event(OTHER, TRACKED), TRACKED, FEE);
        assert_eq!(decision, Classification::Incoming);
        assert!(decision.counts_as_transfer());
    }

    #[test]
    fn test_self_transfer_counts_once() {
        let decision = classify(&event(TRACKED, TRACKED), TRACKED, FEE);
        assert_eq!(decision, Classification::SelfTransfer);
        assert!(decision.counts_as_transfer());
    }

    #[test]
    fn test_unrelated_transfers() {
        assert_eq!(
            classify(&event(OTHER, ANOTHER), TRACKED, FEE),
            Classification::Irrelevant
        );
        // Someone else paying the fee collector is not our fee.
        assert_eq!(
            classify(&event(OTHER, FEE), TRACKED, FEE),
            Classification::Irrelevant
        );
    }

    #[test]
    fn test_fee_collector_refund_is_incoming() {
        assert_eq!(
            classify(&event(FEE, TRACKED), TRACKED, FEE),
            Classification::Incoming
        );
    }

    #[test]
    fn test_tracked_account_is_fee_collector() {
        // Rule 1 wins: a self-transfer to a collector that is the tracked
        // account itself is a fee.
        assert_eq!(
            classify(&event(TRACKED, TRACKED), TRACKED, TRACKED),
            Classification::Fee
        );
        assert_eq!(
            classify(&event(OTHER, TRACKED), TRACKED, TRACKED),
            Classification::Incoming
        );
    }

    /// Reference rendering of the three independent rules, used to check the
    /// tagged decision against every address combination.
    fn independent_rules(ev: &TransferEvent, tracked: Address, fee: Address) -> (u8, u8, u8) {
        if ev.to == fee && ev.from == tracked {
            return (1, 0, 0);
        }
        let outgoing = u8::from(ev.from == tracked && ev.to != fee);
        let incoming = u8::from(ev.to == tracked && ev.from != tracked);
        (0, outgoing, incoming)
    }

    #[test]
    fn test_matches_independent_rules() {
        let addresses = [TRACKED, FEE, OTHER, ANOTHER];
        for fee in [FEE, TRACKED] {
            for from in addresses {
                for to in addresses {
                    let ev = event(from, to);
                    let decision = classify(&ev, TRACKED, fee);
                    let expected = match independent_rules(&ev, TRACKED, fee) {
                        (1, 0, 0) => decision == Classification::Fee,
                        (0, 1, 0) => matches!(
                            decision,
                            Classification::Outgoing | Classification::SelfTransfer
                        ),
                        (0, 0, 1) => decision == Classification::Incoming,
                        (0, 0, 0) => decision == Classification::Irrelevant,
                        other => panic!("rules 2 and 3 fired together: {other:?}"),
                    };
                    assert!(expected, "from={from} to={to} fee={fee} got {decision:?}");
                }
            }
        }
    }
}
