//! Sync engine: one scan cycle per tick until stopped.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use flowstat_core::{aggregate, Address, AggregateSummary, GlobalMetrics, StatsMap, Token};

use super::provider::Ledger;
use super::scanner::{scan_token, ScanOutcome};
use crate::config::SyncConfig;
use crate::error::{IndexerError, Result};
use crate::storage::{resume, CheckpointStore, StatsStore};

/// Source of the ticks that pace the loop.
#[async_trait]
pub trait Ticker: Send {
    /// Wait until the next cycle is due.
    async fn tick(&mut self);
}

/// Fixed-period ticker backed by `tokio::time::interval`.
///
/// The first tick is one full period after creation; late ticks are delayed
/// rather than bursted.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Create a ticker firing every `period`.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Summary of a cycle that scanned and committed a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// First scanned block.
    pub from_block: u64,
    /// Last scanned block, now the checkpoint.
    pub to_block: u64,
    /// Chain height observed at the start of the cycle.
    pub latest_block: u64,
    /// How the decoded transfers were applied, across all tokens.
    pub applied: AggregateSummary,
    /// Logs dropped because they could not be decoded.
    pub undecodable: usize,
    /// Cross-token totals after the cycle.
    pub metrics: GlobalMetrics,
}

impl CycleReport {
    /// True when the committed checkpoint reached the observed head.
    pub fn caught_up(&self) -> bool {
        self.to_block >= self.latest_block
    }
}

/// Result of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No block newer than the checkpoint.
    Idle {
        /// Chain height observed.
        latest_block: u64,
        /// Checkpoint in effect.
        checkpoint: u64,
    },
    /// A range was scanned, stats saved and the checkpoint committed.
    Scanned(CycleReport),
}

/// Sync engine: scans every tracked token over the blocks since the
/// checkpoint, folds the transfers into lifetime stats and persists both.
pub struct SyncEngine<L, C, S> {
    ledger: L,
    checkpoints: C,
    stats: S,
    tokens: Vec<Token>,
    tracked: Address,
    fee_collector: Address,
    config: SyncConfig,
}

impl<L, C, S> SyncEngine<L, C, S>
where
    L: Ledger,
    C: CheckpointStore,
    S: StatsStore,
{
    /// Create a new sync engine.
    pub fn new(
        ledger: L,
        checkpoints: C,
        stats: S,
        tokens: Vec<Token>,
        tracked: Address,
        fee_collector: Address,
        config: SyncConfig,
    ) -> Self {
        Self {
            ledger,
            checkpoints,
            stats,
            tokens,
            tracked,
            fee_collector,
            config,
        }
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// Cycle errors are logged and retried on the next tick. While the
    /// checkpoint trails the head by more than one cycle's worth of blocks,
    /// cycles run back to back.
    pub async fn run<T: Ticker>(&self, mut ticker: T, shutdown: CancellationToken) {
        info!(
            "Sync engine starting: {} tokens, account {}, poll interval {}s",
            self.tokens.len(),
            self.tracked,
            self.config.poll_interval_secs
        );

        while !shutdown.is_cancelled() {
            let caught_up = match self.run_cycle().await {
                Ok(CycleOutcome::Scanned(report)) => report.caught_up(),
                Ok(CycleOutcome::Idle { .. }) => true,
                Err(e) => {
                    error!("Sync cycle failed, retrying next tick: {}", e);
                    true
                }
            };

            if caught_up {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
            }
        }

        info!("Sync engine stopped");
    }

    /// Run one cycle: resolve the range, scan, aggregate, report, persist.
    ///
    /// Stats are saved before the checkpoint is committed. Any failure before
    /// the save leaves both stores untouched, so the same range is retried
    /// in full next time.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let latest_block = self
            .ledger
            .block_number()
            .await
            .map_err(IndexerError::HeightQuery)?;
        let checkpoint = resume(&self.checkpoints, latest_block, self.config.lookback_blocks)?;

        if latest_block <= checkpoint {
            return Ok(CycleOutcome::Idle {
                latest_block,
                checkpoint,
            });
        }

        let from_block = checkpoint + 1;
        let to_block = latest_block.min(checkpoint.saturating_add(self.config.max_blocks_per_cycle));

        info!(
            "New blocks: {} -> {} (scanning {}..={})",
            checkpoint, latest_block, from_block, to_block
        );

        let mut stats = self.stats.load()?;
        let outcomes = self.scan_all(from_block, to_block).await?;

        let mut applied = AggregateSummary::default();
        let mut undecodable = 0;
        for (token, outcome) in self.tokens.iter().zip(&outcomes) {
            let entry = stats.entry(token.name.clone()).or_default();
            let summary = aggregate(
                entry,
                token,
                &outcome.events,
                self.tracked,
                self.fee_collector,
            );
            applied.merge(&summary);
            undecodable += outcome.skipped;

            if entry.transfers > 0 {
                info!(
                    token = %token.name,
                    transfers = entry.transfers,
                    incoming = %entry.incoming,
                    outgoing = %entry.outgoing,
                    fees = %entry.fees,
                    "Lifetime stats"
                );
            }
        }

        let metrics = report_global_metrics(&stats);

        self.stats.save(&stats)?;
        self.checkpoints.commit(to_block)?;

        if undecodable > 0 {
            warn!(
                "Dropped {} undecodable Transfer logs in blocks {}..={}",
                undecodable, from_block, to_block
            );
        }

        Ok(CycleOutcome::Scanned(CycleReport {
            from_block,
            to_block,
            latest_block,
            applied,
            undecodable,
            metrics,
        }))
    }

    /// Scan every token concurrently, keeping registry order.
    ///
    /// Fails if any token failed; the other tokens' results are discarded so
    /// the whole range is retried together.
    async fn scan_all(&self, from_block: u64, to_block: u64) -> Result<Vec<ScanOutcome>> {
        let scans: Vec<_> = self
            .tokens
            .iter()
            .map(|token| scan_token(&self.ledger, token, from_block, to_block))
            .collect();

        let results: Vec<Result<ScanOutcome>> = stream::iter(scans)
            .buffered(self.config.max_concurrent_scans)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(results.len());
        let mut first_failure = None;
        let mut failures = 0;

        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!("{}", e);
                    failures += 1;
                    first_failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_failure {
            error!(
                "{} of {} token scans failed, discarding cycle for blocks {}..={}",
                failures,
                self.tokens.len(),
                from_block,
                to_block
            );
            return Err(e);
        }

        Ok(outcomes)
    }
}

/// Compute and log the cross-token metrics for `stats`.
fn report_global_metrics(stats: &StatsMap) -> GlobalMetrics {
    let metrics = GlobalMetrics::from_stats(stats);

    info!(
        total_transfers = metrics.total_transfers,
        total_volume = %metrics.total_volume,
        total_fees = %metrics.total_fees,
        "Global metrics: effective fee rate {:.4}%",
        metrics.effective_fee_rate
    );

    metrics
}
