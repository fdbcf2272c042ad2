//! Test doubles shared by the listener tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::Address;
use alloy::rpc::types::Log;
use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::listener::Ledger;

/// Scripted ledger: a settable height and a list of logs tagged with blocks.
#[derive(Default)]
pub struct MockLedger {
    height: AtomicU64,
    logs: Mutex<Vec<Log>>,
    failing_contracts: Mutex<HashSet<Address>>,
    fail_height: AtomicBool,
    log_queries: AtomicUsize,
}

impl MockLedger {
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
            ..Default::default()
        }
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn push_log(&self, block: u64, mut log: Log) {
        log.block_number = Some(block);
        self.logs.lock().unwrap().push(log);
    }

    pub fn fail_logs_for(&self, contract: Address) {
        self.failing_contracts.lock().unwrap().insert(contract);
    }

    pub fn heal_logs_for(&self, contract: Address) {
        self.failing_contracts.lock().unwrap().remove(&contract);
    }

    pub fn set_fail_height(&self, fail: bool) {
        self.fail_height.store(fail, Ordering::SeqCst);
    }

    pub fn log_queries(&self) -> usize {
        self.log_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn block_number(&self) -> Result<u64> {
        if self.fail_height.load(Ordering::SeqCst) {
            bail!("height query refused");
        }
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn transfer_logs(
        &self,
        contract: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        self.log_queries.fetch_add(1, Ordering::SeqCst);

        if self.failing_contracts.lock().unwrap().contains(&contract) {
            bail!("eth_getLogs failed for {contract}");
        }

        let logs = self.logs.lock().unwrap();
        Ok(logs
            .iter()
            .filter(|log| log.address() == contract)
            .filter(|log| {
                log.block_number
                    .is_some_and(|block| (from_block..=to_block).contains(&block))
            })
            .cloned()
            .collect())
    }
}
