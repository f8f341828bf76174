use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::BlockId;
use alloy::sol;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::error::PointsError;
use crate::model::chain::Chain;

use super::defillama::DefiLlama;
use super::{BalanceOracle, Balances, VaultAssets};

// ── Vault contract interface ─────────────────────────────────────────

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IPairVault {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function balanceOf(address account) external view returns (uint256);
        function getUnderlyingBalancesByShare(uint256 shares)
            external view returns (uint256 amount0Current, uint256 amount1Current);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IErc20Decimals {
        function decimals() external view returns (uint8);
    }
}

#[derive(Debug, Clone, Copy)]
struct Token {
    address: Address,
    decimals: u8,
}

/// Reads a two-token vault at historical blocks and prices its underlyings
/// through DefiLlama.
pub struct VaultOracle {
    provider: DynProvider,
    vault: Address,
    token0: Token,
    token1: Token,
    chain: Chain,
    prices: DefiLlama,
}

impl VaultOracle {
    /// Connect to the vault and cache its underlying tokens and decimals.
    pub async fn connect(chain: &Chain, vault: &str, prices: DefiLlama) -> Result<Self> {
        let rpc_url = chain
            .rpc_url()
            .with_context(|| format!("chain {chain} requires rpc_url"))?;
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.parse().context("parsing rpc_url")?)
            .erased();
        let vault: Address = vault
            .parse()
            .with_context(|| format!("invalid vault address '{vault}'"))?;

        let contract = IPairVault::new(vault, &provider);
        let token0 = contract
            .token0()
            .call()
            .await
            .context("vault.token0() call failed")?;
        let token1 = contract
            .token1()
            .call()
            .await
            .context("vault.token1() call failed")?;

        let token0 = Token {
            address: token0,
            decimals: query_decimals(&provider, token0).await?,
        };
        let token1 = Token {
            address: token1,
            decimals: query_decimals(&provider, token1).await?,
        };
        info!(
            %vault,
            token0 = %token0.address,
            token1 = %token1.address,
            "connected to vault"
        );

        Ok(Self {
            provider,
            vault,
            token0,
            token1,
            chain: chain.clone(),
            prices,
        })
    }

    fn token(&self, address: &str) -> Option<Token> {
        [self.token0, self.token1]
            .into_iter()
            .find(|t| address_key(&t.address) == address.to_lowercase())
    }
}

#[async_trait]
impl BalanceOracle for VaultOracle {
    async fn assets(&self) -> Result<VaultAssets, PointsError> {
        Ok(VaultAssets {
            token0: address_key(&self.token0.address),
            token1: address_key(&self.token1.address),
        })
    }

    async fn balances_at(&self, address: &str, block: u64) -> Result<Balances, PointsError> {
        let context = format!("balances of {address}@{block}");
        let account: Address = address
            .parse()
            .map_err(|e| PointsError::oracle(&context, e))?;
        let at = BlockId::number(block);
        let contract = IPairVault::new(self.vault, &self.provider);

        let shares = contract
            .balanceOf(account)
            .block(at)
            .call()
            .await
            .map_err(|e| PointsError::oracle(&context, e))?;
        let underlying = contract
            .getUnderlyingBalancesByShare(shares)
            .block(at)
            .call()
            .await
            .map_err(|e| PointsError::oracle(&context, e))?;

        Ok(Balances {
            amount0: from_token_units(underlying.amount0Current, self.token0.decimals),
            amount1: from_token_units(underlying.amount1Current, self.token1.decimals),
        })
    }

    async fn price_usd(&self, token: &str) -> Result<f64, PointsError> {
        if self.token(token).is_none() {
            return Err(PointsError::oracle(
                format!("price of {token}"),
                "not an underlying token of the vault",
            ));
        }
        self.prices.price_usd(self.chain.name(), token).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

async fn query_decimals(provider: &DynProvider, token: Address) -> Result<u8> {
    IErc20Decimals::new(token, provider)
        .decimals()
        .call()
        .await
        .with_context(|| format!("decimals() call failed for {token}"))
}

/// Lowercase `0x…` form used as ledger asset key.
pub fn address_key(address: &Address) -> String {
    address.to_string().to_lowercase()
}

/// Token units to a whole-token amount. The full 256-bit range converts,
/// rounding to the nearest f64.
pub fn from_token_units(units: U256, decimals: u8) -> f64 {
    let divisor = 10f64.powi(decimals as i32);
    f64::from(units) / divisor
}
