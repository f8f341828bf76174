use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::model::chain::Chain;

/// Environment override for `chain.rpc_url`.
pub const RPC_URL_ENV: &str = "POINTS_RPC_URL";
/// Environment override for `db_path`.
pub const DB_PATH_ENV: &str = "POINTS_DB_PATH";

const DB_FILE: &str = "points.db";

fn default_call_timeout() -> u64 {
    30
}

/// Configuration shared by the point runs and the query API.
///
/// ```json
/// {
///   "chain": { "name": "arbitrum", "rpc_url": "https://arb1.arbitrum.io/rpc" },
///   "vault": "0x...",
///   "pioneer_nft": "0x...",
///   "call_timeout_secs": 30,
///   "db_path": "points.db",
///   "fee_factors": { "0x912ce59144191c1204e64559fe8253a0e49e6548": 100.0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsConfig {
    #[serde(default)]
    pub chain: Chain,
    /// Vault whose underlying balances are sampled.
    pub vault: String,
    /// ERC-721 collection granting the pioneer multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pioneer_nft: Option<String>,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    /// Per-asset fee factor used for referral fee attribution.
    #[serde(default)]
    pub fee_factors: HashMap<String, f64>,
}

impl PointsConfig {
    /// Load from a JSON file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config = Self::from_json(&contents)?;
        config.apply_overrides(
            std::env::var(RPC_URL_ENV).ok(),
            std::env::var(DB_PATH_ENV).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let mut config: PointsConfig =
            serde_json::from_str(contents).context("parsing points config")?;
        config.chain = config.chain.with_defaults();
        config.fee_factors = config
            .fee_factors
            .into_iter()
            .map(|(asset, factor)| (asset.to_lowercase(), factor))
            .collect();
        Ok(config)
    }

    pub fn apply_overrides(&mut self, rpc_url: Option<String>, db_path: Option<String>) {
        if let Some(url) = rpc_url.filter(|u| !u.is_empty()) {
            self.chain.rpc_url = Some(url);
        }
        if let Some(path) = db_path.filter(|p| !p.is_empty()) {
            self.db_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.vault
            .parse::<Address>()
            .with_context(|| format!("invalid vault address '{}'", self.vault))?;
        if let Some(nft) = &self.pioneer_nft {
            nft.parse::<Address>()
                .with_context(|| format!("invalid pioneer_nft address '{nft}'"))?;
        }
        if self.chain.rpc_url().is_none() {
            bail!(
                "chain '{}' has no rpc_url; set it in the config or via {RPC_URL_ENV}",
                self.chain
            );
        }
        if self.call_timeout_secs == 0 {
            bail!("call_timeout_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Configured database path, or `<data dir>/guardian-points/points.db`.
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(p) => p.clone(),
            None => dirs::data_dir()
                .map(|d| d.join("guardian-points").join(DB_FILE))
                .unwrap_or_else(|| PathBuf::from(DB_FILE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn test_defaults_fill_in() {
        let config = PointsConfig::from_json(&format!(r#"{{"vault":"{VAULT}"}}"#)).unwrap();
        assert_eq!(config.chain.name(), "arbitrum");
        assert!(config.chain.rpc_url().is_some());
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_and_fee_keys() {
        let mut config = PointsConfig::from_json(&format!(
            r#"{{"vault":"{VAULT}","fee_factors":{{"0xAbC":2.5}}}}"#
        ))
        .unwrap();
        config.apply_overrides(Some("http://localhost:8545".into()), Some("/tmp/p.db".into()));

        assert_eq!(config.chain.rpc_url(), Some("http://localhost:8545"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/p.db"));
        assert_eq!(config.fee_factors.get("0xabc"), Some(&2.5));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_vault = PointsConfig::from_json(r#"{"vault":"not-an-address"}"#).unwrap();
        assert!(bad_vault.validate().is_err());

        let no_rpc = PointsConfig::from_json(&format!(
            r#"{{"vault":"{VAULT}","chain":{{"name":"linea"}}}}"#
        ))
        .unwrap();
        assert!(no_rpc.validate().is_err());

        let zero = PointsConfig::from_json(&format!(
            r#"{{"vault":"{VAULT}","call_timeout_secs":0}}"#
        ))
        .unwrap();
        assert!(zero.validate().is_err());
    }
}
