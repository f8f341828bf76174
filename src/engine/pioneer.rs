use crate::model::PioneerUser;

/// Multiplier for holders of the pioneer NFT.
pub const PIONEER_NFT_MULTIPLIER: f64 = 15.0;

/// Multiplier for everyone else.
pub const BASE_MULTIPLIER: f64 = 6.0;

pub fn pioneer_points(total_usd: f64, has_pioneer_nft: bool) -> f64 {
    if has_pioneer_nft {
        total_usd * PIONEER_NFT_MULTIPLIER
    } else {
        total_usd * BASE_MULTIPLIER
    }
}

impl PioneerUser {
    /// Set NFT status and the final score from the accumulated `total_usd`.
    pub fn finalize(&mut self, has_pioneer_nft: bool) {
        self.has_pioneer_nft = has_pioneer_nft;
        self.points = pioneer_points(self.total_usd, has_pioneer_nft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_follows_nft_flag() {
        let mut holder = PioneerUser::new("0xa");
        holder.total_usd = 120.0;
        holder.finalize(true);
        assert_eq!(holder.points, 1_800.0);

        let mut other = PioneerUser::new("0xb");
        other.total_usd = 120.0;
        other.finalize(false);
        assert_eq!(other.points, 720.0);
        assert!(!other.has_pioneer_nft);
    }

    #[test]
    fn test_zero_exposure_scores_zero() {
        assert_eq!(pioneer_points(0.0, true), 0.0);
        assert_eq!(pioneer_points(0.0, false), 0.0);
    }
}
