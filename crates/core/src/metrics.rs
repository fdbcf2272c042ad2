//! Cross-token summary figures.

use rust_decimal::Decimal;
use std::fmt;

use crate::constants::FEE_RATE_DISPLAY_DP;
use crate::types::StatsMap;

/// Totals across every token, derived from a stats snapshot and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalMetrics {
    /// Sum of `transfers` over all tokens.
    pub total_transfers: u64,
    /// Sum of `outgoing` over all tokens.
    pub total_volume: Decimal,
    /// Sum of `fees` over all tokens.
    pub total_fees: Decimal,
    /// `total_fees / total_volume * 100`, or zero when there is no volume.
    pub effective_fee_rate: Decimal,
}

impl GlobalMetrics {
    /// Compute global metrics from the current stats.
    pub fn from_stats(stats: &StatsMap) -> Self {
        let mut metrics = Self::default();

        for token_stats in stats.values() {
            metrics.total_transfers = metrics.total_transfers.saturating_add(token_stats.transfers);
            metrics.total_volume = metrics.total_volume.saturating_add(token_stats.outgoing);
            metrics.total_fees = metrics.total_fees.saturating_add(token_stats.fees);
        }

        metrics.effective_fee_rate = fee_rate(metrics.total_fees, metrics.total_volume);
        metrics
    }
}

fn fee_rate(fees: Decimal, volume: Decimal) -> Decimal {
    if volume.is_zero() {
        return Decimal::ZERO;
    }

    fees.checked_div(volume)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
}

impl fmt::Display for GlobalMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transfers={} volume={} fees={} fee_rate={:.dp$}%",
            self.total_transfers,
            self.total_volume.normalize(),
            self.total_fees.normalize(),
            self.effective_fee_rate,
            dp = FEE_RATE_DISPLAY_DP as usize
        )
    }
}
