//! Configuration management for the flowstat indexer.
//!
//! This module handles loading configuration from:
//! - TOML files
//! - Environment variables referenced as `${VAR}`
//! - Default values (fallbacks)

use alloy::primitives::{address, Address};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowstat_core::{Token, DEFAULT_LOOKBACK_BLOCKS, MAX_TOKEN_DECIMALS};

/// Protocol fee collector on Tempo testnet.
pub const DEFAULT_FEE_COLLECTOR: Address = address!("feec000000000000000000000000000000000000");

/// Main configuration for the indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network configuration
    pub network: NetworkConfig,

    /// Tracked account and fee collector
    pub account: AccountConfig,

    /// Sync configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// State file locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Token registry, in reporting order
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint (HTTP)
    pub rpc_url: String,
}

/// Account configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account whose flows are tracked
    pub tracked: Address,

    /// Transfers from the tracked account to this address count as fees
    #[serde(default = "default_fee_collector")]
    pub fee_collector: Address,
}

/// Sync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Polling interval in seconds.
    ///
    /// **Must be > 0** - Zero will cause a panic in tokio::time::interval.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Blocks behind the head to start from when no checkpoint exists
    #[serde(default = "default_lookback_blocks")]
    pub lookback_blocks: u64,

    /// Maximum number of token scans in flight at once
    #[serde(default = "default_max_concurrent_scans")]
    pub max_concurrent_scans: usize,

    /// Maximum blocks covered by a single cycle while catching up
    #[serde(default = "default_max_blocks_per_cycle")]
    pub max_blocks_per_cycle: u64,
}

impl SyncConfig {
    /// Polling interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            lookback_blocks: default_lookback_blocks(),
            max_concurrent_scans: default_max_concurrent_scans(),
            max_blocks_per_cycle: default_max_blocks_per_cycle(),
        }
    }
}

/// State file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Last fully processed block, as decimal text
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Lifetime stats per token, as JSON
    #[serde(default = "default_stats_path")]
    pub stats_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: default_checkpoint_path(),
            stats_path: default_stats_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_fee_collector() -> Address {
    DEFAULT_FEE_COLLECTOR
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_lookback_blocks() -> u64 {
    DEFAULT_LOOKBACK_BLOCKS
}

fn default_max_concurrent_scans() -> usize {
    4
}

fn default_max_blocks_per_cycle() -> u64 {
    10_000
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("last_block.txt")
}

fn default_stats_path() -> PathBuf {
    PathBuf::from("analytics_state.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables can be referenced using `${VAR_NAME}` syntax.
    /// For example: `rpc_url = "${TEMPO_RPC_URL}"`
    ///
    /// # Example
    /// ```no_run
    /// # use flowstat_indexer::config::Config;
    /// let config = Config::from_file("flowstat.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = expand_env_vars(&contents)
            .with_context(|| format!("Failed to expand config file: {}", path.display()))?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.network.rpc_url.trim().is_empty() {
            anyhow::bail!("Network RPC URL cannot be empty");
        }

        if self.account.tracked.is_zero() {
            anyhow::bail!("Account tracked must be a non-zero address");
        }
        if self.account.fee_collector.is_zero() {
            anyhow::bail!("Account fee_collector must be a non-zero address");
        }

        if self.sync.poll_interval_secs == 0 {
            anyhow::bail!("Sync poll_interval_secs must be > 0");
        }
        if self.sync.max_concurrent_scans == 0 {
            anyhow::bail!("Sync max_concurrent_scans must be > 0");
        }
        if self.sync.max_blocks_per_cycle == 0 {
            anyhow::bail!("Sync max_blocks_per_cycle must be > 0");
        }

        if self.tokens.is_empty() {
            anyhow::bail!("At least one [[tokens]] entry is required");
        }
        let mut names = HashSet::new();
        for token in &self.tokens {
            if token.name.trim().is_empty() {
                anyhow::bail!("Token name cannot be empty (address {})", token.address);
            }
            if !names.insert(token.name.as_str()) {
                anyhow::bail!("Token name '{}' is listed more than once", token.name);
            }
            if token.decimals > MAX_TOKEN_DECIMALS {
                anyhow::bail!(
                    "Token {} decimals must be <= {} (got {})",
                    token.name,
                    MAX_TOKEN_DECIMALS,
                    token.decimals
                );
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Logging level must be one of: {} (got '{}')",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Logging format must be one of: {} (got '{}')",
                valid_formats.join(", "),
                self.logging.format
            );
        }

        Ok(())
    }
}

/// Expand `${VAR_NAME}` placeholders line by line.
///
/// Text after a `#` that sits outside a quoted string is a comment and is
/// copied through untouched.
fn expand_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());

    for (index, line) in input.split_inclusive('\n').enumerate() {
        let (code, comment) = line.split_at(comment_start(line));
        expand_line(code, &mut result).with_context(|| format!("line {}", index + 1))?;
        result.push_str(comment);
    }

    Ok(result)
}

fn expand_line(mut rest: &str, out: &mut String) -> Result<()> {
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            anyhow::bail!("Unclosed environment variable placeholder");
        };

        let name = &after[..end];
        if name.is_empty() {
            anyhow::bail!("Empty environment variable name");
        }
        let value = std::env::var(name)
            .with_context(|| format!("Environment variable '{}' is not set", name))?;
        out.push_str(&value);

        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(())
}

/// Byte offset of the comment on `line`, or its length if there is none.
fn comment_start(line: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in line.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if ch == '\\' => escaped = true,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '#' => return i,
            None => {}
        }
    }

    line.len()
}
