use tracing::warn;

use crate::model::User;

/// Rank-indexed weight applied when redistributing a guardian's score.
pub const RANK_WEIGHTS: [f64; 5] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Weight of the guardian's own value relative to referral value.
pub const GUARDIAN_WEIGHT: f64 = 10.0;

/// Display scale of the composite score.
pub const SCORE_SCALE: f64 = 100.0;

/// Weight for a 0-based rank; every rank past the table gets the last entry.
pub fn rank_weight(rank: usize) -> f64 {
    RANK_WEIGHTS
        .get(rank)
        .copied()
        .unwrap_or(RANK_WEIGHTS[RANK_WEIGHTS.len() - 1])
}

/// `T = (points * 10 + k) * 100`.
pub fn composite_score(points: f64, k: f64) -> f64 {
    (points * GUARDIAN_WEIGHT + k) * SCORE_SCALE
}

/// A guardian during the ranking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredGuardian {
    pub guardian: User,
    /// Composite score.
    pub t: f64,
    /// Raw referral-driven USD before redistribution.
    pub k: f64,
    pub rank: usize,
    pub weight: f64,
}

impl ScoredGuardian {
    /// Score a fully accumulated guardian. Rank is assigned by [`score_guardians`].
    pub fn new(guardian: User) -> Self {
        let k = guardian.referral_total();
        let t = composite_score(guardian.points, k);
        Self {
            guardian,
            t,
            k,
            rank: 0,
            weight: rank_weight(0),
        }
    }

    /// Replace each referral's raw value with its share of `t * weight`.
    ///
    /// With `k == 0` the shares are undefined; every referral gets 0.
    pub fn redistribute(&mut self) {
        if self.k == 0.0 {
            if !self.guardian.referrals.is_empty() {
                warn!(
                    guardian = %self.guardian.guardian_address,
                    "no referral-driven value; referral points set to zero"
                );
            }
            for referral in &mut self.guardian.referrals {
                referral.points_earned = 0.0;
            }
            return;
        }
        for referral in &mut self.guardian.referrals {
            referral.points_earned = self.t * (referral.points_earned / self.k) * self.weight;
        }
    }
}

/// Rank guardians by descending score and redistribute to their referrals.
///
/// Equal scores keep their input order.
pub fn score_guardians(guardians: Vec<User>) -> Vec<ScoredGuardian> {
    let mut scored: Vec<ScoredGuardian> = guardians.into_iter().map(ScoredGuardian::new).collect();
    scored.sort_by(|a, b| b.t.total_cmp(&a.t));

    for (rank, s) in scored.iter_mut().enumerate() {
        s.rank = rank;
        s.weight = rank_weight(rank);
        s.redistribute();
    }
    scored
}
