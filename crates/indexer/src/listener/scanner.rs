//! Per-token range scanning.

use tracing::{debug, warn};

use flowstat_core::{Token, TransferEvent};

use super::events::decode_transfer;
use super::provider::Ledger;
use crate::error::{IndexerError, Result};

/// Decoded transfers for one token and one block range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Transfers in the order the ledger returned their logs.
    pub events: Vec<TransferEvent>,
    /// Logs that could not be decoded and were dropped.
    pub skipped: usize,
}

/// Fetch and decode `token`'s Transfer logs in `[from_block, to_block]`.
///
/// A failed query is an `IndexerError::LogQuery` so it can never be confused
/// with a quiet range. Individual undecodable logs are logged, counted in
/// `ScanOutcome::skipped` and otherwise ignored.
pub async fn scan_token<L: Ledger + ?Sized>(
    ledger: &L,
    token: &Token,
    from_block: u64,
    to_block: u64,
) -> Result<ScanOutcome> {
    let logs = ledger
        .transfer_logs(token.address, from_block, to_block)
        .await
        .map_err(|reason| IndexerError::LogQuery {
            token: token.name.clone(),
            from_block,
            to_block,
            reason,
        })?;

    let mut outcome = ScanOutcome {
        events: Vec::with_capacity(logs.len()),
        skipped: 0,
    };

    for log in &logs {
        match decode_transfer(log) {
            Ok(event) => outcome.events.push(event),
            Err(e) => {
                // Log parsing error but continue processing other events
                warn!(
                    token = %token.name,
                    block = ?log.block_number,
                    log_index = ?log.log_index,
                    "Failed to decode Transfer log: {:#}",
                    e
                );
                outcome.skipped += 1;
            }
        }
    }

    debug!(
        token = %token.name,
        from_block,
        to_block,
        events = outcome.events.len(),
        skipped = outcome.skipped,
        "Scanned token range"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::events::tests::{raw_log, transfer_log};
    use crate::testing::MockLedger;
    use alloy::primitives::{Address, LogData, U256};

    fn token() -> Token {
        Token::new("AlphaUSD", Address::repeat_byte(0x20), 6)
    }

    #[tokio::test]
    async fn test_scan_preserves_order() {
        let token = token();
        let a = Address::repeat_byte(0x0a);
        let b = Address::repeat_byte(0x0b);
        let ledger = MockLedger::new(10);
        ledger.push_log(100, transfer_log(token.address, a, b, U256::from(2u64)));
        ledger.push_log(101, transfer_log(token.address, b, a, U256::from(1u64)));

        let outcome = scan_token(&ledger, &token, 100, 110).await.unwrap();

        assert_eq!(outcome.skipped, 0);
        assert_eq!(
            outcome.events,
            vec![
                TransferEvent::new(a, b, U256::from(2u64)),
                TransferEvent::new(b, a, U256::from(1u64)),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_respects_range_and_contract() {
        let token = token();
        let other_contract = Address::repeat_byte(0x21);
        let a = Address::repeat_byte(0x0a);
        let ledger = MockLedger::new(10);
        ledger.push_log(99, transfer_log(token.address, a, a, U256::from(1u64)));
        ledger.push_log(105, transfer_log(other_contract, a, a, U256::from(1u64)));
        ledger.push_log(111, transfer_log(token.address, a, a, U256::from(1u64)));

        let outcome = scan_token(&ledger, &token, 100, 110).await.unwrap();

        assert!(outcome.events.is_empty());
    }

    #[tokio::test]
    async fn test_scan_counts_undecodable_logs() {
        let token = token();
        let a = Address::repeat_byte(0x0a);
        let ledger = MockLedger::new(10);
        ledger.push_log(100, raw_log(token.address, LogData::default()));
        ledger.push_log(100, transfer_log(token.address, a, a, U256::from(3u64)));

        let outcome = scan_token(&ledger, &token, 100, 100).await.unwrap();

        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.events.len(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_not_an_empty_result() {
        let token = token();
        let ledger = MockLedger::new(10);
        ledger.fail_logs_for(token.address);

        let err = scan_token(&ledger, &token, 5, 9).await.unwrap_err();

        match err {
            IndexerError::LogQuery {
                token,
                from_block,
                to_block,
                ..
            } => {
                assert_eq!(token, "AlphaUSD");
                assert_eq!((from_block, to_block), (5, 9));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
