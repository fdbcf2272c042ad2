//! Flowstat Indexer - lifetime ERC-20 flow statistics for one account
//!
//! This binary provides:
//! - The poll loop: scan new blocks, update stats, commit the checkpoint
//! - A one-shot cycle for cron-style use
//! - A status view of the persisted checkpoint and stats

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use flowstat_indexer::config::{Config, LoggingConfig};
use flowstat_indexer::listener::{CycleOutcome, IntervalTicker, RpcLedger, SyncEngine};
use flowstat_indexer::storage::{CheckpointStore, FileCheckpointStore, FileStatsStore, StatsStore};
use flowstat_indexer::GlobalMetrics;

type FileSyncEngine = SyncEngine<RpcLedger, FileCheckpointStore, FileStatsStore>;

#[derive(Parser)]
#[command(name = "flowstat-indexer")]
#[command(version, about = "Lifetime ERC-20 flow statistics for one tracked account", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "flowstat.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for new blocks until Ctrl+C
    Run,

    /// Run a single sync cycle and exit
    Once,

    /// Show the checkpoint, lifetime stats and global metrics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config).context("Failed to load configuration")?;

    init_logging(&config.logging, cli.debug)?;

    info!("Flowstat Indexer starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_indexer(config).await?,
        Commands::Once => run_once(config).await?,
        Commands::Status => show_status(&config)?,
    }

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(logging: &LoggingConfig, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = if debug {
        EnvFilter::new("flowstat_indexer=debug,flowstat_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "flowstat_indexer={0},flowstat_core={0}",
                logging.level
            ))
        })
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let initialized = if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_line_number(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    initialized.context("Failed to initialize logging")?;

    Ok(())
}

/// Connect to the ledger and assemble the engine over the configured files.
async fn build_engine(config: &Config) -> Result<FileSyncEngine> {
    info!("  RPC URL: {}", config.network.rpc_url);
    info!("  Tracked account: {}", config.account.tracked);
    info!("  Fee collector: {}", config.account.fee_collector);
    info!(
        "  Tokens: {}",
        config
            .tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let ledger = RpcLedger::connect(&config.network.rpc_url)
        .await
        .context("Failed to connect to the ledger")?;

    Ok(SyncEngine::new(
        ledger,
        FileCheckpointStore::new(&config.storage.checkpoint_path),
        FileStatsStore::new(&config.storage.stats_path),
        config.tokens.clone(),
        config.account.tracked,
        config.account.fee_collector,
        config.sync.clone(),
    ))
}

/// Main indexer service - runs the poll loop until Ctrl+C
async fn run_indexer(config: Config) -> Result<()> {
    let engine = build_engine(&config).await?;
    let ticker = IntervalTicker::new(config.sync.poll_interval());
    let shutdown = CancellationToken::new();

    let mut sync_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { engine.run(ticker, shutdown).await }
    });

    info!("Indexer is running. Press Ctrl+C to stop.");

    tokio::select! {
        result = &mut sync_handle => {
            result.context("Sync task panicked")?;
            warn!("Sync engine exited unexpectedly");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Received shutdown signal, finishing the current cycle...");
            shutdown.cancel();
            sync_handle.await.context("Sync task panicked")?;
        }
    }

    Ok(())
}

/// Run one cycle and report what it did
async fn run_once(config: Config) -> Result<()> {
    let engine = build_engine(&config).await?;

    match engine.run_cycle().await.context("Sync cycle failed")? {
        CycleOutcome::Idle {
            latest_block,
            checkpoint,
        } => {
            info!(
                "No new blocks (head {}, checkpoint {})",
                latest_block, checkpoint
            );
        }
        CycleOutcome::Scanned(report) => {
            info!(
                "Scanned blocks {}..={}: {} transfers applied, {} ignored",
                report.from_block,
                report.to_block,
                report.applied.applied(),
                report.applied.irrelevant
            );
            if !report.caught_up() {
                info!(
                    "{} blocks remain behind the head, run again to catch up",
                    report.latest_block - report.to_block
                );
            }
        }
    }

    Ok(())
}

/// Print the persisted state without touching the network
fn show_status(config: &Config) -> Result<()> {
    let checkpoints = FileCheckpointStore::new(&config.storage.checkpoint_path);
    let stats = FileStatsStore::new(&config.storage.stats_path)
        .load()
        .context("Failed to read stats file")?;

    println!("\n=== Flowstat Indexer Status ===\n");
    println!("Account:");
    println!("  Tracked: {}", config.account.tracked);
    println!("  Fee Collector: {}", config.account.fee_collector);

    println!("\nSync Progress:");
    match checkpoints.load() {
        Ok(Some(block)) => println!("  Last Block: {}", block),
        Ok(None) => println!("  Last Block: none (no cycle committed yet)"),
        Err(e) => println!("  Last Block: unreadable ({})", e),
    }
    println!("  Checkpoint File: {}", checkpoints.path().display());
    println!("  Stats File: {}", config.storage.stats_path.display());

    println!("\nLifetime Stats:");
    for token in &config.tokens {
        match stats.get(&token.name) {
            Some(entry) => println!(
                "  {}: transfers={} incoming={} outgoing={} fees={}",
                token.name, entry.transfers, entry.incoming, entry.outgoing, entry.fees
            ),
            None => println!("  {}: no data yet", token.name),
        }
    }
    for name in stats.keys() {
        if !config.tokens.iter().any(|token| &token.name == name) {
            println!("  {}: present in stats file but not configured", name);
        }
    }

    println!("\nGlobal Metrics:");
    let metrics = GlobalMetrics::from_stats(&stats);
    println!("  Total Transfers: {}", metrics.total_transfers);
    println!("  Total Volume: {}", metrics.total_volume);
    println!("  Total Fees: {}", metrics.total_fees);
    println!("  Effective Fee Rate: {:.4}%", metrics.effective_fee_rate);
    println!();

    Ok(())
}
