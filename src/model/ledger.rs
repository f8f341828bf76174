use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Contribution of one asset to one day bucket.
///
/// Both fields are additive: every sample taken on a day adds to the
/// entry for that day rather than replacing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Token amount, in whole units (already scaled by decimals).
    pub absolute_value: f64,
    /// USD value of `absolute_value` at the sampled price.
    pub usd_value: f64,
}

impl AssetInfo {
    pub fn new(absolute_value: f64, usd_value: f64) -> Self {
        Self {
            absolute_value,
            usd_value,
        }
    }

    fn add(&mut self, absolute_value: f64, usd_value: f64) {
        self.absolute_value += absolute_value;
        self.usd_value += usd_value;
    }
}

/// Per-asset, per-day value ledger.
///
/// Keys are asset address → day key → [`AssetInfo`]. The day key is the
/// decimal-string Unix timestamp of 00:00:00 UTC of the sampled day, which
/// is also how the ledger serializes (nested JSON objects).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TvlLedger {
    assets: BTreeMap<String, BTreeMap<String, AssetInfo>>,
}

// ── Mutation ─────────────────────────────────────────────────────────

impl TvlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contribution to `(asset, day)`, creating the entry if absent.
    pub fn record(&mut self, asset: &str, day: &str, absolute_value: f64, usd_value: f64) {
        self.assets
            .entry(asset.to_string())
            .or_default()
            .entry(day.to_string())
            .or_default()
            .add(absolute_value, usd_value);
    }

    /// Copy entries of `older` whose `(asset, day)` is not present here.
    ///
    /// Used when a fresh run is stored over a previous document: days the
    /// run recomputed win, history it did not touch is kept.
    pub fn backfill(&mut self, older: &TvlLedger) {
        for (asset, days) in &older.assets {
            let ours = self.assets.entry(asset.clone()).or_default();
            for (day, info) in days {
                ours.entry(day.clone()).or_insert(*info);
            }
        }
    }
}

// ── Queries ──────────────────────────────────────────────────────────

impl TvlLedger {
    pub fn get(&self, asset: &str, day: &str) -> Option<&AssetInfo> {
        self.assets.get(asset)?.get(day)
    }

    /// Iterate `(asset, day, info)` triples.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &AssetInfo)> {
        self.assets.iter().flat_map(|(asset, days)| {
            days.iter()
                .map(move |(day, info)| (asset.as_str(), day.as_str(), info))
        })
    }

    pub fn total_usd(&self) -> f64 {
        self.entries().map(|(_, _, info)| info.usd_value).sum()
    }

    /// USD summed across assets, per day (ascending by day).
    ///
    /// Entries whose day key is not a number are skipped.
    pub fn usd_by_day(&self) -> BTreeMap<u64, f64> {
        let mut out = BTreeMap::new();
        for (_, day, info) in self.entries() {
            if let Some(ts) = parse_day(day) {
                *out.entry(ts).or_insert(0.0) += info.usd_value;
            }
        }
        out
    }

    /// Per-asset totals over every day.
    pub fn totals_by_asset(&self) -> BTreeMap<String, AssetInfo> {
        self.assets
            .iter()
            .map(|(asset, days)| {
                let mut total = AssetInfo::default();
                for info in days.values() {
                    total.add(info.absolute_value, info.usd_value);
                }
                (asset.clone(), total)
            })
            .collect()
    }

    /// Sub-ledger holding only days within `start..=end` (Unix seconds).
    pub fn range(&self, start: u64, end: u64) -> TvlLedger {
        let mut out = TvlLedger::new();
        for (asset, day, info) in self.entries() {
            match parse_day(day) {
                Some(ts) if ts >= start && ts <= end => {
                    out.record(asset, day, info.absolute_value, info.usd_value)
                }
                _ => {}
            }
        }
        out
    }

    /// Most recent day present for any asset.
    pub fn latest_day(&self) -> Option<u64> {
        self.entries().filter_map(|(_, day, _)| parse_day(day)).max()
    }

    /// Asset → info for a single day.
    pub fn day(&self, day: u64) -> BTreeMap<String, AssetInfo> {
        let key = day.to_string();
        self.assets
            .iter()
            .filter_map(|(asset, days)| days.get(&key).map(|info| (asset.clone(), *info)))
            .collect()
    }
}

fn parse_day(day: &str) -> Option<u64> {
    day.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WETH: &str = "0x82af49447d8a07e3bd95bd0d56f35241523fbab1";
    const ARB: &str = "0x912ce59144191c1204e64559fe8253a0e49e6548";

    #[test]
    fn test_record_accumulates_same_day() {
        let mut ledger = TvlLedger::new();
        ledger.record(WETH, "1700000000", 1.0, 2000.0);
        ledger.record(WETH, "1700000000", 0.5, 1000.0);

        let info = ledger.get(WETH, "1700000000").unwrap();
        assert_eq!(info.absolute_value, 1.5);
        assert_eq!(info.usd_value, 3000.0);
    }

    #[test]
    fn test_backfill_keeps_recomputed_days() {
        let mut fresh = TvlLedger::new();
        fresh.record(WETH, "200", 1.0, 10.0);

        let mut older = TvlLedger::new();
        older.record(WETH, "100", 5.0, 50.0);
        older.record(WETH, "200", 9.0, 90.0);
        older.record(ARB, "100", 3.0, 3.0);

        fresh.backfill(&older);
        assert_eq!(fresh.get(WETH, "200").unwrap().usd_value, 10.0);
        assert_eq!(fresh.get(WETH, "100").unwrap().usd_value, 50.0);
        assert_eq!(fresh.get(ARB, "100").unwrap().usd_value, 3.0);
    }

    #[test]
    fn test_range_and_aggregates() {
        let mut ledger = TvlLedger::new();
        ledger.record(WETH, "86400", 1.0, 10.0);
        ledger.record(ARB, "86400", 2.0, 4.0);
        ledger.record(WETH, "172800", 1.0, 20.0);
        ledger.record(WETH, "259200", 1.0, 30.0);

        let window = ledger.range(86400, 172800);
        assert_eq!(window.total_usd(), 34.0);
        assert!(window.get(WETH, "259200").is_none());

        let by_day = ledger.usd_by_day();
        assert_eq!(by_day.get(&86400), Some(&14.0));
        assert_eq!(ledger.latest_day(), Some(259200));

        let totals = ledger.totals_by_asset();
        assert_eq!(totals[WETH], AssetInfo::new(3.0, 60.0));
        assert_eq!(ledger.day(86400).len(), 2);
    }

    #[test]
    fn test_serializes_as_nested_objects() {
        let mut ledger = TvlLedger::new();
        ledger.record(WETH, "86400", 1.0, 10.0);
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json[WETH]["86400"]["usd_value"], 10.0);

        let back: TvlLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger);
    }
}
