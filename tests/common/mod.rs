#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use guardian_points::error::PointsError;
use guardian_points::oracle::{BalanceOracle, Balances, BlockResolver, NftOwnership, VaultAssets};

pub const TOKEN0: &str = "0x82af49447d8a07e3bd95bd0d56f35241523fbab1";
pub const TOKEN1: &str = "0xaf88d065e77c8cc2239327c5edb3a432268e5831";
pub const PRICE0: f64 = 2.0;
pub const PRICE1: f64 = 3.0;

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── Mock resolver ───────────────────────────────────────────────────

/// Maps a timestamp to `ts / 10`, or fails with a fixed error.
#[derive(Default)]
pub struct MockResolver {
    pub error: Option<PointsError>,
    pub calls: Mutex<Vec<u64>>,
}

impl MockResolver {
    pub fn failing(error: PointsError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BlockResolver for MockResolver {
    async fn resolve(&self, _chain: &str, timestamp: u64) -> Result<u64, PointsError> {
        self.calls.lock().unwrap().push(timestamp);
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(timestamp / 10),
        }
    }
}

// ── Mock oracle ─────────────────────────────────────────────────────

/// Constant balances per address; unknown addresses hold nothing.
#[derive(Default)]
pub struct MockOracle {
    pub balances: HashMap<String, Balances>,
    pub failing: HashSet<String>,
    /// Addresses whose reads never complete within any sane timeout.
    pub stalled: HashSet<String>,
    pub reads: Mutex<Vec<(String, u64)>>,
}

impl MockOracle {
    pub fn with(mut self, address: &str, amount0: f64, amount1: f64) -> Self {
        self.balances
            .insert(address.to_string(), Balances::new(amount0, amount1));
        self
    }

    pub fn failing(mut self, address: &str) -> Self {
        self.failing.insert(address.to_string());
        self
    }

    pub fn stalled(mut self, address: &str) -> Self {
        self.stalled.insert(address.to_string());
        self
    }

    pub fn blocks_read_for(&self, address: &str) -> Vec<u64> {
        let mut blocks: Vec<u64> = self
            .reads
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == address)
            .map(|(_, b)| *b)
            .collect();
        blocks.sort_unstable();
        blocks
    }
}

#[async_trait]
impl BalanceOracle for MockOracle {
    async fn assets(&self) -> Result<VaultAssets, PointsError> {
        Ok(VaultAssets {
            token0: TOKEN0.into(),
            token1: TOKEN1.into(),
        })
    }

    async fn balances_at(&self, address: &str, block: u64) -> Result<Balances, PointsError> {
        self.reads.lock().unwrap().push((address.to_string(), block));
        if self.stalled.contains(address) {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
        }
        if self.failing.contains(address) {
            return Err(PointsError::oracle(
                format!("balances of {address}@{block}"),
                "execution reverted",
            ));
        }
        Ok(self.balances.get(address).copied().unwrap_or_default())
    }

    async fn price_usd(&self, token: &str) -> Result<f64, PointsError> {
        match token {
            TOKEN0 => Ok(PRICE0),
            TOKEN1 => Ok(PRICE1),
            other => Err(PointsError::oracle(format!("price of {other}"), "unknown token")),
        }
    }
}

// ── Mock NFT ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNft {
    pub holders: HashSet<String>,
    pub failing: HashSet<String>,
}

impl MockNft {
    pub fn holder(mut self, address: &str) -> Self {
        self.holders.insert(address.to_string());
        self
    }

    pub fn failing(mut self, address: &str) -> Self {
        self.failing.insert(address.to_string());
        self
    }
}

#[async_trait]
impl NftOwnership for MockNft {
    async fn check(&self, address: &str) -> Result<bool, PointsError> {
        if self.failing.contains(address) {
            return Err(PointsError::OwnershipCheck {
                address: address.to_string(),
                reason: "rpc error".into(),
            });
        }
        Ok(self.holders.contains(address))
    }
}
