use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::PointsError;

use super::BlockResolver;

const COINS_URL: &str = "https://coins.llama.fi";

// ── API response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BlockResponse {
    #[serde(alias = "block")]
    height: u64,
    #[allow(dead_code)]
    timestamp: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    coins: HashMap<String, CoinPrice>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct CoinPrice {
    price: f64,
    symbol: Option<String>,
    decimals: Option<u8>,
    timestamp: Option<u64>,
    confidence: Option<f64>,
}

// ── Client ───────────────────────────────────────────────────────────

/// DefiLlama coins API: block-by-timestamp and current token prices.
#[derive(Clone)]
pub struct DefiLlama {
    client: reqwest::Client,
    base_url: String,
}

impl DefiLlama {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("guardian-points/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: COINS_URL.to_string(),
        })
    }

    /// Point the client at another host (self-hosted mirror, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Current USD price of `token` on `chain`.
    pub async fn price_usd(&self, chain: &str, token: &str) -> Result<f64, PointsError> {
        let coin = format!("{chain}:{token}");
        let url = format!("{}/prices/current/{coin}", self.base_url);
        let context = format!("price of {coin}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PointsError::oracle(&context, e))?
            .json::<PricesResponse>()
            .await
            .map_err(|e| PointsError::oracle(&context, e))?;

        price_from_response(&resp, &coin).ok_or_else(|| {
            PointsError::oracle(context, "coin missing from DefiLlama response")
        })
    }
}

fn price_from_response(resp: &PricesResponse, coin: &str) -> Option<f64> {
    resp.coins
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(coin))
        .map(|(_, p)| p.price)
        .filter(|p| p.is_finite())
}

/// DefiLlama answers 400/404 when no block exists at or before the timestamp.
/// Every other client error (rate limits, timeouts) is transient.
fn no_block_at(status: reqwest::StatusCode) -> bool {
    matches!(
        status,
        reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::NOT_FOUND
    )
}

#[async_trait]
impl BlockResolver for DefiLlama {
    async fn resolve(&self, chain: &str, timestamp: u64) -> Result<u64, PointsError> {
        let url = format!("{}/block/{chain}/{timestamp}", self.base_url);
        let unavailable = |reason: String| PointsError::ResolverUnavailable {
            chain: chain.to_string(),
            timestamp,
            reason,
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = resp.status();
        if no_block_at(status) {
            let body = resp.text().await.unwrap_or_default();
            debug!(chain, timestamp, %status, body = %body, "block lookup rejected");
            return Err(PointsError::BeforeGenesis {
                chain: chain.to_string(),
                timestamp,
            });
        }
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        let block = resp
            .json::<BlockResponse>()
            .await
            .map_err(|e| unavailable(format!("decoding block response: {e}")))?;
        if block.height == 0 {
            return Err(PointsError::BeforeGenesis {
                chain: chain.to_string(),
                timestamp,
            });
        }
        Ok(block.height)
    }
}
