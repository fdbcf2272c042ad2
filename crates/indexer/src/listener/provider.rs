//! Ledger access: the `Ledger` port and its HTTP RPC implementation.

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use alloy::transports::http::{Client, Http};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::events::Transfer;
use crate::error::IndexerError;

/// Read access to the ledger needed by the sync engine.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current chain height.
    async fn block_number(&self) -> Result<u64>;

    /// Raw `Transfer` logs emitted by `contract` in `[from_block, to_block]`,
    /// in the order the node returns them.
    async fn transfer_logs(
        &self,
        contract: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>>;
}

#[async_trait]
impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    async fn block_number(&self) -> Result<u64> {
        (**self).block_number().await
    }

    async fn transfer_logs(
        &self,
        contract: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        (**self).transfer_logs(contract, from_block, to_block).await
    }
}

/// HTTP RPC provider for querying the ledger.
#[derive(Clone)]
pub struct RpcLedger {
    provider: RootProvider<Http<Client>>,
}

impl RpcLedger {
    /// Create a provider for `rpc_url` without contacting the node.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self { provider })
    }

    /// Create a provider and check that the node answers.
    ///
    /// Any failure is reported as `IndexerError::Connection`.
    pub async fn connect(rpc_url: &str) -> std::result::Result<Self, IndexerError> {
        let connection_error = |reason: anyhow::Error| IndexerError::Connection {
            url: rpc_url.to_string(),
            reason,
        };

        let ledger = Self::new(rpc_url).map_err(connection_error)?;
        let height = ledger.block_number().await.map_err(connection_error)?;

        info!("Connected to {} at block {}", rpc_url, height);

        Ok(ledger)
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("Failed to get block number")
    }

    async fn transfer_logs(
        &self,
        contract: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        // Create filter for Transfer events
        let filter = Filter::new()
            .address(contract)
            .event_signature(Transfer::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let logs: Vec<Log> = self
            .provider
            .get_logs(&filter)
            .await
            .context("Failed to fetch logs from RPC")?;

        debug!(
            "Fetched {} Transfer logs for {} in blocks {}..={}",
            logs.len(),
            contract,
            from_block,
            to_block
        );

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_url() {
        assert!(RpcLedger::new("not a url").is_err());
    }

    #[test]
    fn test_accepts_http_url() {
        assert!(RpcLedger::new("http://localhost:8545").is_ok());
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        // Nothing listens on port 9 (discard) on a test host.
        let result = RpcLedger::connect("http://127.0.0.1:9").await;
        match result {
            Err(e) => assert!(e.is_fatal(), "unexpected error: {e}"),
            Ok(_) => panic!("connect to a closed port succeeded"),
        }
    }
}
