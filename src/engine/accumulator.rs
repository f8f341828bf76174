use crate::model::{PioneerUser, Referral, TvlLedger, User};
use crate::oracle::{Balances, VaultAssets};

use super::sampler::SAMPLES_PER_DAY;

/// USD prices of the two vault assets, fixed for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssetPrices {
    pub price0: f64,
    pub price1: f64,
}

/// How one sample weighs into the day's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplePolicy {
    /// Each sample contributes 1/6 of its value: the day total approximates
    /// the daily mean. Referral, pioneer, and guardian points.
    Averaged,
    /// Each sample contributes its full value. Guardian TVL ledger.
    Summed,
}

impl SamplePolicy {
    pub fn divisor(self) -> f64 {
        match self {
            SamplePolicy::Averaged => SAMPLES_PER_DAY as f64,
            SamplePolicy::Summed => 1.0,
        }
    }
}

/// One sample's value, per asset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contribution {
    pub amount0: f64,
    pub amount1: f64,
    pub usd0: f64,
    pub usd1: f64,
}

impl Contribution {
    pub fn of(balances: &Balances, prices: &AssetPrices) -> Self {
        Self {
            amount0: balances.amount0,
            amount1: balances.amount1,
            usd0: balances.amount0 * prices.price0,
            usd1: balances.amount1 * prices.price1,
        }
    }

    pub fn weighted(self, policy: SamplePolicy) -> Self {
        let d = policy.divisor();
        Self {
            amount0: self.amount0 / d,
            amount1: self.amount1 / d,
            usd0: self.usd0 / d,
            usd1: self.usd1 / d,
        }
    }

    pub fn usd(&self) -> f64 {
        self.usd0 + self.usd1
    }
}

/// Folds balance samples of a run into account ledgers.
///
/// Every sample of a run lands in the same day bucket (`day_key`).
pub struct TvlAccumulator<'a> {
    assets: &'a VaultAssets,
    prices: AssetPrices,
    day_key: String,
}

impl<'a> TvlAccumulator<'a> {
    pub fn new(assets: &'a VaultAssets, prices: AssetPrices, day_key: impl Into<String>) -> Self {
        Self {
            assets,
            prices,
            day_key: day_key.into(),
        }
    }

    pub fn day_key(&self) -> &str {
        &self.day_key
    }

    /// Record one sample into `ledger` under `policy`, returning what was added.
    pub fn record(
        &self,
        ledger: &mut TvlLedger,
        balances: &Balances,
        policy: SamplePolicy,
    ) -> Contribution {
        let c = Contribution::of(balances, &self.prices).weighted(policy);
        self.record_contribution(ledger, &c);
        c
    }

    fn record_contribution(&self, ledger: &mut TvlLedger, c: &Contribution) {
        ledger.record(&self.assets.token0, &self.day_key, c.amount0, c.usd0);
        ledger.record(&self.assets.token1, &self.day_key, c.amount1, c.usd1);
    }

    /// Referral sample: averaged into its TVL ledger and raw `points_earned`.
    pub fn referral_sample(&self, referral: &mut Referral, balances: &Balances) -> Contribution {
        let c = self.record(&mut referral.tvl_by_day, balances, SamplePolicy::Averaged);
        referral.points_earned += c.usd();
        c
    }

    /// Guardian sample: full value into the TVL ledger, averaged into `points`.
    pub fn guardian_sample(&self, guardian: &mut User, balances: &Balances) {
        let full = self.record(&mut guardian.tvl_by_day, balances, SamplePolicy::Summed);
        guardian.points += full.weighted(SamplePolicy::Averaged).usd();
    }

    /// Attribute a referral's (already averaged) contribution to its guardian.
    pub fn earned_sample(&self, guardian: &mut User, referral_contribution: &Contribution) {
        self.record_contribution(&mut guardian.earned_asset_by_day, referral_contribution);
    }

    /// Pioneer sample: averaged USD exposure.
    pub fn pioneer_sample(&self, pioneer: &mut PioneerUser, balances: &Balances) {
        pioneer.total_usd += Contribution::of(balances, &self.prices)
            .weighted(SamplePolicy::Averaged)
            .usd();
    }
}
