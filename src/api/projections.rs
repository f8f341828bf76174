//! Read-side aggregates over stored guardian documents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{AssetInfo, TvlLedger, User};

const SECS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAmount {
    pub amount: f64,
    /// Day key (decimal Unix seconds).
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsSummary {
    /// Percent change from the first to the last day of the window, e.g. `"12.50%"`.
    pub change: String,
    pub data: Vec<DailyAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEarning {
    pub address: String,
    pub amount: f64,
    #[serde(rename = "usdAmount")]
    pub usd_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralFee {
    #[serde(rename = "referralAddress")]
    pub referral_address: String,
    #[serde(rename = "feeEarned")]
    pub fee_earned: f64,
}

/// Referral-driven earnings per day over the last `days` days before `now`.
pub fn total_referral_earnings(guardian: &User, now: u64, days: u32) -> EarningsSummary {
    let start = now.saturating_sub(days as u64 * SECS_PER_DAY);
    let by_day = guardian.earned_asset_by_day.range(start, now).usd_by_day();

    let first = by_day.values().next().copied().unwrap_or(0.0);
    let last = by_day.values().next_back().copied().unwrap_or(0.0);
    let change = if first != 0.0 {
        (last - first) / first * 100.0
    } else {
        0.0
    };

    EarningsSummary {
        change: format!("{change:.2}%"),
        data: by_day
            .into_iter()
            .map(|(day, amount)| DailyAmount {
                amount,
                timestamp: day.to_string(),
            })
            .collect(),
    }
}

/// Referral-driven earnings per asset, over all stored days.
pub fn earnings_by_asset(guardian: &User) -> Vec<AssetEarning> {
    guardian
        .earned_asset_by_day
        .totals_by_asset()
        .into_iter()
        .map(|(address, total)| AssetEarning {
            address,
            amount: total.absolute_value,
            usd_amount: total.usd_value,
        })
        .collect()
}

/// Fee attributed to each referral from its share of the latest day's TVL.
///
/// Per asset: `referral / (referral + guardian) * fee_factor`, skipped when
/// the combined value is zero. Assets without a fee factor contribute 0.
pub fn referral_fees(guardian: &User, fee_factors: &HashMap<String, f64>) -> Vec<ReferralFee> {
    let guardian_latest = latest_slice(&guardian.tvl_by_day);

    guardian
        .referrals
        .iter()
        .map(|referral| {
            let mut fee = 0.0;
            for (asset, info) in latest_slice(&referral.tvl_by_day) {
                let referral_value = info.absolute_value;
                let guardian_value = guardian_latest
                    .get(&asset)
                    .map(|i| i.absolute_value)
                    .unwrap_or(0.0);
                let total = referral_value + guardian_value;
                let factor = fee_factors
                    .get(&asset.to_lowercase())
                    .copied()
                    .unwrap_or(0.0);
                if total > 0.0 {
                    fee += referral_value / total * factor;
                }
            }
            ReferralFee {
                referral_address: referral.referral_address.clone(),
                fee_earned: fee,
            }
        })
        .collect()
}

fn latest_slice(ledger: &TvlLedger) -> std::collections::BTreeMap<String, AssetInfo> {
    ledger
        .latest_day()
        .map(|day| ledger.day(day))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Referral;

    const T0: &str = "0xt0";
    const T1: &str = "0xt1";

    fn day(n: u64) -> String {
        (n * SECS_PER_DAY).to_string()
    }

    #[test]
    fn test_total_earnings_window_and_change() {
        let mut g = User::guardian("0xg", "alpha");
        g.earned_asset_by_day.record(T0, &day(1), 1.0, 50.0);
        g.earned_asset_by_day.record(T0, &day(10), 1.0, 100.0);
        g.earned_asset_by_day.record(T1, &day(10), 1.0, 20.0);
        g.earned_asset_by_day.record(T0, &day(12), 1.0, 150.0);

        let now = 12 * SECS_PER_DAY + 3_600;
        let summary = total_referral_earnings(&g, now, 7);

        assert_eq!(summary.data.len(), 2);
        assert_eq!(summary.data[0].timestamp, day(10));
        assert_eq!(summary.data[0].amount, 120.0);
        assert_eq!(summary.change, "25.00%");
    }

    #[test]
    fn test_total_earnings_empty_window() {
        let g = User::guardian("0xg", "alpha");
        let summary = total_referral_earnings(&g, 1_000_000, 7);
        assert!(summary.data.is_empty());
        assert_eq!(summary.change, "0.00%");
    }

    #[test]
    fn test_earnings_by_asset() {
        let mut g = User::guardian("0xg", "alpha");
        g.earned_asset_by_day.record(T0, &day(1), 1.0, 10.0);
        g.earned_asset_by_day.record(T0, &day(2), 2.0, 30.0);
        g.earned_asset_by_day.record(T1, &day(2), 5.0, 5.0);

        let out = earnings_by_asset(&g);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0],
            AssetEarning {
                address: T0.into(),
                amount: 3.0,
                usd_amount: 40.0
            }
        );
        let json = serde_json::to_value(&out[1]).unwrap();
        assert_eq!(json["usdAmount"], 5.0);
    }

    #[test]
    fn test_referral_fees_use_latest_day_share() {
        let mut g = User::guardian("0xg", "alpha");
        g.tvl_by_day.record(T0, &day(1), 100.0, 100.0);
        g.tvl_by_day.record(T0, &day(2), 3.0, 3.0);

        let mut r = Referral::new("0xr", "alpha");
        r.tvl_by_day.record(T0, &day(2), 1.0, 1.0);
        r.tvl_by_day.record(T1, &day(2), 4.0, 4.0);
        g.referrals.push(r);
        g.referrals.push(Referral::new("0xempty", "alpha"));

        let factors = HashMap::from([(T0.to_string(), 100.0), (T1.to_string(), 10.0)]);
        let fees = referral_fees(&g, &factors);

        // T0: 1 / (1 + 3) * 100; T1: guardian has none → 4 / 4 * 10
        assert_eq!(fees[0].fee_earned, 35.0);
        assert_eq!(fees[1].fee_earned, 0.0);
        assert_eq!(fees[1].referral_address, "0xempty");
    }
}
