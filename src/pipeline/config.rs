//! Analysis configuration from environment variables

use crate::detector_core::{EventThresholds, HorizonLengths, HorizonWeights};
use std::env;
use std::str::FromStr;

/// Thresholds and window sizes for an analysis context
///
/// Loaded from environment variables with sensible defaults.
/// `AnalysisConfig::default()` equals `from_env()` with nothing set.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Volume moving-average window, in observations
    pub ma_period: usize,

    /// Spike-ratio event ladder
    pub thresholds: EventThresholds,

    /// Short/medium/long z-score windows, in observations
    pub horizons: HorizonLengths,

    /// Weights of the composite spike ratio (sorting only)
    pub weights: HorizonWeights,

    /// Recency window for event extraction, in calendar days
    pub event_history_days: i64,

    /// Events listed in the summary
    pub latest_events: usize,

    /// Entries in the top-spikes list
    pub top_spikes: usize,

    /// Observations covered by a per-instrument analysis
    pub ticker_lookback: usize,

    /// Instruments with events that get a per-instrument analysis
    pub max_ticker_analyses: usize,

    /// Lifetime of cached upstream series, in seconds
    pub cache_ttl_secs: i64,

    /// Fetch period used when a request does not name one
    pub default_period: String,

    /// Fetch period of the quick scan
    pub quick_scan_period: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ma_period: 20,
            thresholds: EventThresholds::default(),
            horizons: HorizonLengths::default(),
            weights: HorizonWeights::default(),
            event_history_days: 30,
            latest_events: 10,
            top_spikes: 10,
            ticker_lookback: 90,
            max_ticker_analyses: 5,
            cache_ttl_secs: 300,
            default_period: "1y".to_string(),
            quick_scan_period: "5d".to_string(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl AnalysisConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `VOLQUANT_MA_PERIOD` (default: 20)
    /// - `VOLQUANT_EVENT_DAYS` (default: 30)
    /// - `VOLQUANT_LATEST_EVENTS` (default: 10)
    /// - `VOLQUANT_TOP_SPIKES` (default: 10)
    /// - `VOLQUANT_TICKER_LOOKBACK` (default: 90)
    /// - `VOLQUANT_MAX_TICKER_ANALYSES` (default: 5)
    /// - `VOLQUANT_CACHE_TTL_SECS` (default: 300)
    /// - `VOLQUANT_DEFAULT_PERIOD` (default: 1y)
    /// - `VOLQUANT_THRESHOLD_EXTREME` / `_HIGH` / `_MEDIUM` / `_ALERT` (default: 2.5 / 2.0 / 1.5 / 1.3)
    /// - `VOLQUANT_HORIZON_SHORT` / `_MEDIUM` / `_LONG` (default: 5 / 20 / 252)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ma_period: env_or("VOLQUANT_MA_PERIOD", defaults.ma_period),

            thresholds: EventThresholds {
                extreme: env_or("VOLQUANT_THRESHOLD_EXTREME", defaults.thresholds.extreme),
                high: env_or("VOLQUANT_THRESHOLD_HIGH", defaults.thresholds.high),
                medium: env_or("VOLQUANT_THRESHOLD_MEDIUM", defaults.thresholds.medium),
                alert: env_or("VOLQUANT_THRESHOLD_ALERT", defaults.thresholds.alert),
            },

            horizons: HorizonLengths {
                short: env_or("VOLQUANT_HORIZON_SHORT", defaults.horizons.short),
                medium: env_or("VOLQUANT_HORIZON_MEDIUM", defaults.horizons.medium),
                long: env_or("VOLQUANT_HORIZON_LONG", defaults.horizons.long),
            },

            weights: defaults.weights,

            event_history_days: env_or("VOLQUANT_EVENT_DAYS", defaults.event_history_days),

            latest_events: env_or("VOLQUANT_LATEST_EVENTS", defaults.latest_events),

            top_spikes: env_or("VOLQUANT_TOP_SPIKES", defaults.top_spikes),

            ticker_lookback: env_or("VOLQUANT_TICKER_LOOKBACK", defaults.ticker_lookback),

            max_ticker_analyses: env_or(
                "VOLQUANT_MAX_TICKER_ANALYSES",
                defaults.max_ticker_analyses,
            ),

            cache_ttl_secs: env_or("VOLQUANT_CACHE_TTL_SECS", defaults.cache_ttl_secs),

            default_period: env::var("VOLQUANT_DEFAULT_PERIOD")
                .unwrap_or(defaults.default_period),

            quick_scan_period: defaults.quick_scan_period,
        }
    }
}
