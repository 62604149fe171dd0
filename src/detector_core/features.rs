//! Rolling Feature Engine
//!
//! Partitions observations by instrument, sorts each partition by date and
//! annotates every observation with volume moving average, spike ratio and
//! period-over-period changes.
//!
//! The moving average uses an inclusive trailing window: the `ma_period`
//! observations ending at (and including) the current one.

use super::events::{EventLevel, EventThresholds};
use super::window::{trailing, MIN_WINDOW_POINTS};
use crate::series::{Observation, SeriesStore};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub observation: Observation,
    pub volume_ma: Option<f64>,
    pub spike_ratio: Option<f64>,
    pub volume_change_pct: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub event_level: Option<EventLevel>,
}

impl FeatureRecord {
    pub fn instrument(&self) -> &str {
        &self.observation.instrument
    }

    pub fn date(&self) -> NaiveDate {
        self.observation.date
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEngine {
    ma_period: usize,
    thresholds: EventThresholds,
}

impl FeatureEngine {
    pub fn new(ma_period: usize, thresholds: EventThresholds) -> Self {
        Self {
            ma_period: ma_period.max(1),
            thresholds,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(20, EventThresholds::default())
    }

    pub fn ma_period(&self) -> usize {
        self.ma_period
    }

    fn min_periods(&self) -> usize {
        MIN_WINDOW_POINTS.min(self.ma_period)
    }

    /// Annotate observations. Input order does not matter; output is grouped
    /// by instrument (ascending, trimmed and upper-cased) and sorted by date
    /// within each group. Of several rows sharing a date only one survives:
    /// the lowest under (close, open, high, low, volume).
    pub fn compute(&self, observations: &[Observation]) -> Vec<FeatureRecord> {
        let mut partitions: BTreeMap<String, Vec<&Observation>> = BTreeMap::new();
        for obs in observations {
            partitions
                .entry(obs.instrument.trim().to_uppercase())
                .or_default()
                .push(obs);
        }

        let mut records = Vec::with_capacity(observations.len());
        for (instrument, mut partition) in partitions {
            partition.sort_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then(a.close.total_cmp(&b.close))
                    .then(a.open.total_cmp(&b.open))
                    .then(a.high.total_cmp(&b.high))
                    .then(a.low.total_cmp(&b.low))
                    .then(a.volume.cmp(&b.volume))
            });

            let before = partition.len();
            partition.dedup_by_key(|obs| obs.date);
            if partition.len() < before {
                log::warn!(
                    "⚠️  {}: dropped {} duplicate-date rows",
                    instrument,
                    before - partition.len()
                );
            }

            records.extend(self.compute_partition(&instrument, &partition));
        }
        records
    }

    pub fn compute_store(&self, store: &SeriesStore) -> Vec<FeatureRecord> {
        let observations: Vec<Observation> = store.observations().cloned().collect();
        self.compute(&observations)
    }

    fn compute_partition(&self, instrument: &str, partition: &[&Observation]) -> Vec<FeatureRecord> {
        let volumes: Vec<Option<f64>> = partition.iter().map(|obs| obs.volume_f64()).collect();

        partition
            .iter()
            .enumerate()
            .map(|(i, obs)| {
                let window = trailing(&volumes, i + 1, self.ma_period);
                let volume_ma = if window.len() >= self.min_periods() {
                    Some(window.iter().sum::<f64>() / window.len() as f64)
                } else {
                    None
                };

                let spike_ratio = match (volumes[i], volume_ma) {
                    (Some(volume), Some(ma)) if ma != 0.0 => Some(volume / ma),
                    _ => None,
                };

                let (volume_change_pct, price_change_pct) = if i == 0 {
                    (None, None)
                } else {
                    let prev = partition[i - 1];
                    (
                        pct_change(prev.volume_f64(), volumes[i]),
                        pct_change(Some(prev.close), Some(obs.close)),
                    )
                };

                let mut observation = (*obs).clone();
                observation.instrument = instrument.to_string();

                FeatureRecord {
                    observation,
                    volume_ma,
                    spike_ratio,
                    volume_change_pct,
                    price_change_pct,
                    event_level: self.thresholds.classify(spike_ratio),
                }
            })
            .collect()
    }
}

/// Relative change in percent; None when either side is missing or the base is zero
pub fn pct_change(prev: Option<f64>, current: Option<f64>) -> Option<f64> {
    let (prev, current) = (prev?, current?);
    if prev == 0.0 {
        return None;
    }
    let change = (current - prev) / prev * 100.0;
    change.is_finite().then_some(change)
}
