//! Per-instrument analysis over a trailing window of observations

use super::correlator::CorrelationEngine;
use super::events::{latest_events, VolumeEvent};
use super::features::FeatureRecord;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct TickerAnalysis {
    pub instrument: String,
    pub current_date: NaiveDate,
    pub current_price: f64,
    pub current_volume: Option<u64>,
    /// Mean of the valid volumes inside the lookback window
    pub avg_volume: Option<f64>,
    pub volume_ma: Option<f64>,
    pub spike_ratio: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub lookback: usize,
    pub event_count: usize,
    pub volume_price_correlation: Option<f64>,
    pub recent_events: Vec<VolumeEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: Option<u64>,
    pub spike_ratio: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerDetail {
    pub instrument: String,
    pub latest: LatestSnapshot,
    pub history: Vec<FeatureRecord>,
    /// Every event of the instrument, no recency cut
    pub events: Vec<VolumeEvent>,
}

pub struct TickerAnalyzer {
    lookback: usize,
    recent_events_limit: usize,
    correlator: CorrelationEngine,
}

impl TickerAnalyzer {
    pub fn new(lookback: usize, recent_events_limit: usize) -> Self {
        Self {
            lookback,
            recent_events_limit,
            correlator: CorrelationEngine::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(90, 5)
    }

    fn history_of(records: &[FeatureRecord], instrument: &str) -> Vec<FeatureRecord> {
        let instrument = instrument.to_uppercase();
        let mut history: Vec<FeatureRecord> = records
            .iter()
            .filter(|r| r.instrument() == instrument)
            .cloned()
            .collect();
        history.sort_by_key(|r| r.date());
        history
    }

    /// Summary of the last `lookback` observations of one instrument.
    /// None when the instrument has no records.
    pub fn analyze(
        &self,
        records: &[FeatureRecord],
        instrument: &str,
        detected_at: DateTime<Utc>,
    ) -> Option<TickerAnalysis> {
        let history = Self::history_of(records, instrument);
        let latest = history.last()?;
        let window = &history[history.len().saturating_sub(self.lookback)..];

        let volumes: Vec<f64> = window
            .iter()
            .filter_map(|r| r.observation.volume_f64())
            .collect();
        let avg_volume = if volumes.is_empty() {
            None
        } else {
            Some(volumes.iter().sum::<f64>() / volumes.len() as f64)
        };

        let events: Vec<VolumeEvent> = window
            .iter()
            .filter_map(|r| VolumeEvent::from_record(r, detected_at))
            .collect();

        Some(TickerAnalysis {
            instrument: latest.instrument().to_string(),
            current_date: latest.date(),
            current_price: latest.observation.close,
            current_volume: latest.observation.volume,
            avg_volume,
            volume_ma: latest.volume_ma,
            spike_ratio: latest.spike_ratio,
            price_change_pct: latest.price_change_pct,
            lookback: window.len(),
            event_count: events.len(),
            volume_price_correlation: self.correlator.volume_price_correlation(window),
            recent_events: latest_events(&events, self.recent_events_limit),
        })
    }

    /// Full history, all events and the latest snapshot of one instrument
    pub fn detail(
        &self,
        records: &[FeatureRecord],
        instrument: &str,
        detected_at: DateTime<Utc>,
    ) -> Option<TickerDetail> {
        let history = Self::history_of(records, instrument);
        let latest = history.last()?;

        let price_change = history
            .len()
            .checked_sub(2)
            .map(|i| latest.observation.close - history[i].observation.close)
            .filter(|c| c.is_finite());

        let latest = LatestSnapshot {
            date: latest.date(),
            price: latest.observation.close,
            volume: latest.observation.volume,
            spike_ratio: latest.spike_ratio,
            price_change,
            price_change_pct: latest.price_change_pct,
        };

        let events = history
            .iter()
            .filter_map(|r| VolumeEvent::from_record(r, detected_at))
            .collect();

        Some(TickerDetail {
            instrument: instrument.to_uppercase(),
            latest,
            history,
            events,
        })
    }
}
