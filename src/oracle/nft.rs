use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::error::PointsError;
use crate::model::chain::Chain;

use super::NftOwnership;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IErc721Balance {
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Pioneer NFT check: the account owns at least one token of the collection.
pub struct Erc721Ownership {
    provider: DynProvider,
    collection: Address,
}

impl Erc721Ownership {
    pub fn connect(chain: &Chain, collection: &str) -> Result<Self> {
        let rpc_url = chain
            .rpc_url()
            .with_context(|| format!("chain {chain} requires rpc_url"))?;
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.parse().context("parsing rpc_url")?)
            .erased();
        let collection = collection
            .parse()
            .with_context(|| format!("invalid pioneer NFT address '{collection}'"))?;
        Ok(Self {
            provider,
            collection,
        })
    }
}

#[async_trait]
impl NftOwnership for Erc721Ownership {
    async fn check(&self, address: &str) -> Result<bool, PointsError> {
        let failed = |reason: String| PointsError::OwnershipCheck {
            address: address.to_string(),
            reason,
        };
        let owner: Address = address.parse().map_err(|e| failed(format!("{e}")))?;
        let balance = IErc721Balance::new(self.collection, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| failed(e.to_string()))?;
        Ok(balance > U256::ZERO)
    }
}

/// Used when no pioneer collection is configured: nobody holds the NFT.
pub struct NoPioneerCollection;

#[async_trait]
impl NftOwnership for NoPioneerCollection {
    async fn check(&self, _address: &str) -> Result<bool, PointsError> {
        Ok(false)
    }
}
