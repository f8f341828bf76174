use serde::{Deserialize, Serialize};

use super::ledger::TvlLedger;

/// An account referred by a guardian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    pub referral_address: String,
    /// Code of the guardian that referred this account.
    pub referrer_code: String,
    /// Raw referral-driven USD while sampling; the redistributed share of
    /// the guardian's score once ranking has run.
    pub points_earned: f64,
    #[serde(default)]
    pub tvl_by_day: TvlLedger,
}

impl Referral {
    pub fn new(referral_address: impl Into<String>, referrer_code: impl Into<String>) -> Self {
        Self {
            referral_address: referral_address.into(),
            referrer_code: referrer_code.into(),
            points_earned: 0.0,
            tvl_by_day: TvlLedger::new(),
        }
    }
}

/// A guardian document: the top-level referrer and its referrals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub guardian_address: String,
    pub referrer_code: String,
    #[serde(rename = "isReferrer")]
    pub is_referrer: bool,
    /// The guardian's own sampled USD exposure. Never redistributed.
    pub points: f64,
    /// Referral-driven value attributed to this guardian, per asset and day.
    #[serde(default)]
    pub earned_asset_by_day: TvlLedger,
    #[serde(default)]
    pub tvl_by_day: TvlLedger,
    #[serde(default)]
    pub referrals: Vec<Referral>,
}

impl User {
    pub fn guardian(address: impl Into<String>, referrer_code: impl Into<String>) -> Self {
        Self {
            guardian_address: address.into(),
            referrer_code: referrer_code.into(),
            is_referrer: true,
            points: 0.0,
            earned_asset_by_day: TvlLedger::new(),
            tvl_by_day: TvlLedger::new(),
            referrals: Vec::new(),
        }
    }

    /// Sum of every referral's `points_earned`.
    pub fn referral_total(&self) -> f64 {
        self.referrals.iter().map(|r| r.points_earned).sum()
    }

    pub fn referral(&self, address: &str) -> Option<&Referral> {
        self.referrals
            .iter()
            .find(|r| r.referral_address.eq_ignore_ascii_case(address))
    }

    /// Carry ledger history from a previously stored document into this one.
    ///
    /// Days recomputed by this run take precedence. Only referrals still
    /// listed by this run inherit history; the rest are dropped with their
    /// stale points.
    pub fn absorb_history(&mut self, previous: &User) {
        self.tvl_by_day.backfill(&previous.tvl_by_day);
        self.earned_asset_by_day
            .backfill(&previous.earned_asset_by_day);

        for current in &mut self.referrals {
            if let Some(old) = previous
                .referrals
                .iter()
                .find(|r| r.referral_address == current.referral_address)
            {
                current.tvl_by_day.backfill(&old.tvl_by_day);
            }
        }
    }
}

/// A pioneer-program participant. No hierarchy, flat score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PioneerUser {
    pub address: String,
    pub total_usd: f64,
    pub has_pioneer_nft: bool,
    pub points: f64,
}

impl PioneerUser {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            total_usd: 0.0,
            has_pioneer_nft: false,
            points: 0.0,
        }
    }
}

/// One guardian in a run's input file.
///
/// The run input is an ordered list; that order breaks ties between
/// guardians with equal scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianEntry {
    pub guardian: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer_code: Option<String>,
    #[serde(default)]
    pub referrals: Vec<String>,
}

impl GuardianEntry {
    pub fn new(guardian: impl Into<String>, referrals: &[&str]) -> Self {
        Self {
            guardian: guardian.into(),
            referrer_code: None,
            referrals: referrals.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn address(&self) -> String {
        self.guardian.to_lowercase()
    }

    /// Configured code, or the lowercased guardian address when none is set.
    pub fn referrer_code(&self) -> String {
        self.referrer_code
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.address())
    }

    pub fn referral_addresses(&self) -> Vec<String> {
        self.referrals.iter().map(|r| r.to_lowercase()).collect()
    }
}
