//! Multi-horizon statistics for an instrument's latest observation
//!
//! Each horizon compares the current volume against the N observations
//! strictly preceding it. With less history the window shrinks to what is
//! available; below `MIN_WINDOW_POINTS` the z-score is 0.0.

use super::features::FeatureRecord;
use super::window::{trailing, Horizon, HorizonLengths, WindowStats, MIN_WINDOW_POINTS};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonReading {
    /// Never NaN; 0.0 when the window carries no deviation signal
    pub z_score: f64,
    pub spike_ratio: Option<f64>,
    /// Valid points in the (possibly degraded) window
    pub window_len: usize,
}

impl HorizonReading {
    fn flat(window_len: usize) -> Self {
        Self {
            z_score: 0.0,
            spike_ratio: None,
            window_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizonStatistics {
    pub instrument: String,
    pub date: NaiveDate,
    pub current_volume: Option<u64>,
    pub short: HorizonReading,
    pub medium: HorizonReading,
    pub long: HorizonReading,
    /// Share of long-window volumes strictly below the current one, 0-100
    pub percentile: Option<f64>,
}

impl HorizonStatistics {
    pub fn reading(&self, horizon: Horizon) -> &HorizonReading {
        match horizon {
            Horizon::Short => &self.short,
            Horizon::Medium => &self.medium,
            Horizon::Long => &self.long,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HorizonAnalyzer {
    lengths: HorizonLengths,
}

impl HorizonAnalyzer {
    pub fn new(lengths: HorizonLengths) -> Self {
        Self { lengths }
    }

    pub fn lengths(&self) -> HorizonLengths {
        self.lengths
    }

    /// Statistics for the last record of one instrument's history.
    /// `records` must be a single instrument, ascending by date.
    pub fn compute(&self, records: &[FeatureRecord]) -> Option<HorizonStatistics> {
        let latest = records.last()?;
        debug_assert!(records.windows(2).all(|w| w[0].date() <= w[1].date()));

        let volumes: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.observation.volume_f64())
            .collect();
        let current = latest.observation.volume_f64();
        let end = volumes.len() - 1;

        let reading = |horizon: Horizon| {
            let window = trailing(&volumes, end, self.lengths.length(horizon));
            horizon_reading(&window, current)
        };

        let long_window = trailing(&volumes, end, self.lengths.long);

        Some(HorizonStatistics {
            instrument: latest.instrument().to_string(),
            date: latest.date(),
            current_volume: latest.observation.volume,
            short: reading(Horizon::Short),
            medium: reading(Horizon::Medium),
            long: reading(Horizon::Long),
            percentile: current.and_then(|c| percentile_rank(&long_window, c)),
        })
    }
}

fn horizon_reading(window: &[f64], current: Option<f64>) -> HorizonReading {
    let (Some(current), Some(stats)) = (current, WindowStats::from_values(window)) else {
        return HorizonReading::flat(window.len());
    };

    let spike_ratio = if stats.count >= MIN_WINDOW_POINTS && stats.mean > 0.0 {
        Some(current / stats.mean).filter(|s| s.is_finite())
    } else {
        None
    };

    HorizonReading {
        z_score: stats.z_score(current),
        spike_ratio,
        window_len: stats.count,
    }
}

/// Percentage of `history` strictly less than `current`
pub fn percentile_rank(history: &[f64], current: f64) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    let below = history.iter().filter(|v| **v < current).count();
    Some(below as f64 / history.len() as f64 * 100.0)
}
