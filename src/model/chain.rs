use serde::{Deserialize, Serialize};

/// A chain by name, with its optional id and RPC endpoint.
///
/// In JSON, chains are always objects:
/// - `{"name": "arbitrum", "chain_id": 42161, "rpc_url": "https://arb1.arbitrum.io/rpc"}`
/// - `{"name": "arbitrum"}` (chain_id/rpc_url filled from the known list)
///
/// `name` doubles as the DefiLlama chain slug used for block and price lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chain {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
}

// ── Methods ──────────────────────────────────────────────────────────

impl Chain {
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_url.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fill missing chain_id/rpc_url from the known chain of the same name.
    pub fn with_defaults(self) -> Self {
        let known = Self::from_name(&self.name);
        Chain {
            chain_id: self.chain_id.or(known.chain_id),
            rpc_url: self.rpc_url.or(known.rpc_url),
            name: self.name,
        }
    }
}

// ── Convenience constructors ─────────────────────────────────────────

impl Chain {
    pub fn arbitrum() -> Self {
        Chain {
            name: "arbitrum".into(),
            chain_id: Some(42161),
            rpc_url: Some("https://arb1.arbitrum.io/rpc".into()),
        }
    }
    pub fn ethereum() -> Self {
        Chain {
            name: "ethereum".into(),
            chain_id: Some(1),
            rpc_url: Some("https://eth.llamarpc.com".into()),
        }
    }
    pub fn optimism() -> Self {
        Chain {
            name: "optimism".into(),
            chain_id: Some(10),
            rpc_url: Some("https://mainnet.optimism.io".into()),
        }
    }
    pub fn base() -> Self {
        Chain {
            name: "base".into(),
            chain_id: Some(8453),
            rpc_url: Some("https://mainnet.base.org".into()),
        }
    }

    /// Construct a chain from its name, matching known chains.
    /// Falls back to a name-only chain for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "arbitrum" => Self::arbitrum(),
            "ethereum" => Self::ethereum(),
            "optimism" => Self::optimism(),
            "base" => Self::base(),
            _ => Chain {
                name: name.into(),
                chain_id: None,
                rpc_url: None,
            },
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::arbitrum()
    }
}

// ── Display ──────────────────────────────────────────────────────────

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
