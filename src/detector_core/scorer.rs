//! Weighted composite spike ratio across horizons
//!
//! Kept for legacy ordering of sector lists only. Signal classification
//! never reads it.

use super::horizon::HorizonStatistics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonWeights {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

impl Default for HorizonWeights {
    fn default() -> Self {
        Self {
            short: 0.5,
            medium: 0.3,
            long: 0.2,
        }
    }
}

pub struct SpikeScorer {
    weights: HorizonWeights,
}

impl SpikeScorer {
    pub fn new(weights: HorizonWeights) -> Self {
        Self { weights }
    }

    pub fn with_defaults() -> Self {
        Self::new(HorizonWeights::default())
    }

    /// Weighted average of the three horizon spike ratios.
    /// None if any horizon has no spike ratio.
    pub fn compute_weighted_spike(&self, stats: &HorizonStatistics) -> Option<f64> {
        let short = stats.short.spike_ratio?;
        let medium = stats.medium.spike_ratio?;
        let long = stats.long.spike_ratio?;

        let total_weight = self.weights.short + self.weights.medium + self.weights.long;
        if total_weight <= 0.0 {
            return None;
        }

        let score =
            short * self.weights.short + medium * self.weights.medium + long * self.weights.long;

        Some(score / total_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector_core::horizon::HorizonReading;
    use chrono::NaiveDate;

    fn reading(spike_ratio: Option<f64>) -> HorizonReading {
        HorizonReading {
            z_score: 0.0,
            spike_ratio,
            window_len: 20,
        }
    }

    fn stats(short: Option<f64>, medium: Option<f64>, long: Option<f64>) -> HorizonStatistics {
        HorizonStatistics {
            instrument: "XLK".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            current_volume: Some(100),
            short: reading(short),
            medium: reading(medium),
            long: reading(long),
            percentile: None,
        }
    }

    #[test]
    fn test_default_weights() {
        let scorer = SpikeScorer::with_defaults();
        let score = scorer
            .compute_weighted_spike(&stats(Some(2.0), Some(1.0), Some(0.5)))
            .unwrap();

        // 1.0 + 0.3 + 0.1
        assert!((score - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_missing_component() {
        let scorer = SpikeScorer::with_defaults();
        assert_eq!(
            scorer.compute_weighted_spike(&stats(Some(2.0), None, Some(0.5))),
            None
        );
    }

    #[test]
    fn test_weights_normalized() {
        let scorer = SpikeScorer::new(HorizonWeights {
            short: 2.0,
            medium: 1.0,
            long: 1.0,
        });
        let score = scorer
            .compute_weighted_spike(&stats(Some(3.0), Some(1.0), Some(1.0)))
            .unwrap();

        assert!((score - 2.0).abs() < 1e-12);
    }
}
