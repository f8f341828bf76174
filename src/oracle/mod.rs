//! Collaborator interfaces consumed by the engine, and their live
//! implementations.

pub mod defillama;
pub mod nft;
pub mod vault;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PointsError;

/// Underlying balances of one account's vault shares at one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub amount0: f64,
    pub amount1: f64,
}

impl Balances {
    pub fn new(amount0: f64, amount1: f64) -> Self {
        Self { amount0, amount1 }
    }
}

/// The vault's two underlying tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultAssets {
    pub token0: String,
    pub token1: String,
}

/// Maps a Unix timestamp to the block at or before it.
#[async_trait]
pub trait BlockResolver: Send + Sync {
    /// Fails with [`PointsError::BeforeGenesis`] when the chain has no block
    /// that early, and [`PointsError::ResolverUnavailable`] for service errors.
    async fn resolve(&self, chain: &str, timestamp: u64) -> Result<u64, PointsError>;
}

/// Vault balances and asset prices.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    async fn assets(&self) -> Result<VaultAssets, PointsError>;

    async fn balances_at(&self, address: &str, block: u64) -> Result<Balances, PointsError>;

    async fn price_usd(&self, token: &str) -> Result<f64, PointsError>;
}

/// Pioneer NFT ownership.
#[async_trait]
pub trait NftOwnership: Send + Sync {
    async fn check(&self, address: &str) -> Result<bool, PointsError>;
}
