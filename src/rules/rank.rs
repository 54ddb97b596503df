//! Rank curve: competency tier from level

/// Maps levels to ranks
pub trait RankCurve: Send + Sync {
    /// Rank reached at `level`
    fn rank_for_level(&self, level: f64) -> u32;

    /// Lowest level that reaches `rank` (clamped to the top of the curve)
    fn min_level_for_rank(&self, rank: u32) -> f64;
}

/// Rank = number of thresholds at or below the level
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRankCurve {
    thresholds: Vec<f64>,
}

impl ThresholdRankCurve {
    /// `thresholds` must be ascending; see `ForgeConfig::validate`
    pub fn new(thresholds: Vec<f64>) -> Self {
        Self { thresholds }
    }

    pub fn max_rank(&self) -> u32 {
        self.thresholds.len() as u32
    }
}

impl Default for ThresholdRankCurve {
    fn default() -> Self {
        Self::new(crate::core::config::ForgeConfig::default().rank_thresholds)
    }
}

impl RankCurve for ThresholdRankCurve {
    fn rank_for_level(&self, level: f64) -> u32 {
        if !level.is_finite() {
            return 0;
        }
        self.thresholds.partition_point(|t| *t <= level) as u32
    }

    fn min_level_for_rank(&self, rank: u32) -> f64 {
        if rank == 0 {
            return 0.0;
        }
        let idx = (rank.min(self.max_rank()) as usize).saturating_sub(1);
        self.thresholds.get(idx).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_curve() {
        let curve = ThresholdRankCurve::default();
        assert_eq!(curve.rank_for_level(0.0), 0);
        assert_eq!(curve.rank_for_level(1.0), 1);
        assert_eq!(curve.rank_for_level(2.0), 1);
        assert_eq!(curve.rank_for_level(3.0), 2);
        assert_eq!(curve.rank_for_level(9.5), 3);
        assert_eq!(curve.rank_for_level(100.0), 7);
    }

    #[test]
    fn test_min_level_for_rank() {
        let curve = ThresholdRankCurve::default();
        assert_eq!(curve.min_level_for_rank(0), 0.0);
        assert_eq!(curve.min_level_for_rank(3), 6.0);
        assert_eq!(curve.min_level_for_rank(99), 28.0);
    }

    #[test]
    fn test_empty_curve_is_rank_zero() {
        let curve = ThresholdRankCurve::new(vec![]);
        assert_eq!(curve.rank_for_level(50.0), 0);
        assert_eq!(curve.min_level_for_rank(4), 0.0);
    }

    proptest! {
        #[test]
        fn prop_min_level_round_trips(rank in 0u32..20) {
            let curve = ThresholdRankCurve::default();
            let level = curve.min_level_for_rank(rank);
            prop_assert_eq!(curve.rank_for_level(level), rank.min(curve.max_rank()));
        }

        #[test]
        fn prop_rank_is_monotonic(a in 0.0f64..40.0, b in 0.0f64..40.0) {
            let curve = ThresholdRankCurve::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.rank_for_level(lo) <= curve.rank_for_level(hi));
        }
    }
}
