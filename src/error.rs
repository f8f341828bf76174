use thiserror::Error;

/// Failures of the points pipeline and its collaborators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PointsError {
    #[error("timestamp {timestamp} is before the genesis of {chain}")]
    BeforeGenesis { chain: String, timestamp: u64 },

    #[error("block resolver unavailable for {chain}@{timestamp}: {reason}")]
    ResolverUnavailable {
        chain: String,
        timestamp: u64,
        reason: String,
    },

    #[error("oracle read failed ({context}): {reason}")]
    Oracle { context: String, reason: String },

    #[error("pioneer NFT check failed for {address}: {reason}")]
    OwnershipCheck { address: String, reason: String },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("store error: {0}")]
    Store(String),

    #[error("task failed: {0}")]
    Task(String),
}

impl PointsError {
    pub fn oracle(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PointsError::Oracle {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether re-running the same computation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PointsError::ResolverUnavailable { .. } | PointsError::Timeout { .. }
        )
    }
}

impl From<rusqlite::Error> for PointsError {
    fn from(err: rusqlite::Error) -> Self {
        PointsError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for PointsError {
    fn from(err: serde_json::Error) -> Self {
        PointsError::Store(format!("document encoding: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        let unavailable = PointsError::ResolverUnavailable {
            chain: "arbitrum".into(),
            timestamp: 1,
            reason: "503".into(),
        };
        let genesis = PointsError::BeforeGenesis {
            chain: "arbitrum".into(),
            timestamp: 1,
        };
        assert!(unavailable.is_retryable());
        assert!(!genesis.is_retryable());
        assert!(
            PointsError::Timeout {
                operation: "balances".into(),
                seconds: 30
            }
            .is_retryable()
        );
    }
}
