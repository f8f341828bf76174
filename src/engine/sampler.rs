use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Observations taken per reporting day.
pub const SAMPLES_PER_DAY: usize = 6;

/// Seconds between two consecutive samples.
pub const SAMPLE_SPACING_SECS: u64 = 4 * 60 * 60;

/// The fixed sampling instants of one UTC reporting day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePlan {
    timestamps: Vec<u64>,
}

impl SamplePlan {
    /// Six instants, 4h apart, starting at 00:00:00 UTC of `day`.
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_time(NaiveTime::MIN).and_utc().timestamp().max(0) as u64;
        let timestamps = (0..SAMPLES_PER_DAY as u64)
            .map(|i| start + i * SAMPLE_SPACING_SECS)
            .collect();
        Self { timestamps }
    }

    /// Plan for the UTC calendar day preceding `now`.
    pub fn yesterday(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self::for_day(today.pred_opt().unwrap_or(today))
    }

    /// Ascending sampling instants (Unix seconds).
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Start of the sampled day; every sample folds into this bucket.
    pub fn day_start(&self) -> u64 {
        self.timestamps.first().copied().unwrap_or(0)
    }

    /// Ledger day key: decimal string of [`Self::day_start`].
    pub fn day_key(&self) -> String {
        self.day_start().to_string()
    }

    pub fn day(&self) -> NaiveDate {
        DateTime::from_timestamp(self.day_start() as i64, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_six_samples_four_hours_apart() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 13, 45, 12).unwrap();
        let plan = SamplePlan::yesterday(now);

        assert_eq!(plan.len(), SAMPLES_PER_DAY);
        for pair in plan.timestamps().windows(2) {
            assert_eq!(pair[1] - pair[0], SAMPLE_SPACING_SECS);
        }

        let day_start = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap().timestamp() as u64;
        assert_eq!(plan.day_start(), day_start);
        assert_eq!(plan.day_key(), day_start.to_string());
        assert!(plan.timestamps().iter().all(|ts| *ts < day_start + 86_400));
    }

    #[test]
    fn test_yesterday_across_month_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let plan = SamplePlan::yesterday(now);
        assert_eq!(plan.day(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(plan.timestamps()[5] - plan.timestamps()[0], 20 * 60 * 60);
    }

    #[test]
    fn test_for_day_matches_yesterday() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 23, 59, 59).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        assert_eq!(SamplePlan::yesterday(now), SamplePlan::for_day(day));
    }
}
