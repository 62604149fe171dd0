//! Cross-instrument aggregation for a named group of instruments

use super::detector::{IntensityTier, SignalDetector, SignalLabel};
use super::features::FeatureRecord;
use super::horizon::{HorizonAnalyzer, HorizonStatistics};
use super::scorer::SpikeScorer;
use std::collections::BTreeMap;

/// Number of trailing spike ratios averaged into `avg_spike`
const AVG_SPIKE_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SectorEntry {
    pub name: String,
    pub instrument: String,
    pub stats: HorizonStatistics,
    pub signal: SignalLabel,
    pub tier: IntensityTier,
    pub weighted_spike: Option<f64>,
    /// Mean of the last five non-null spike ratios
    pub avg_spike: Option<f64>,
    pub current_spike: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorSummary {
    /// Sorted by short-horizon z-score, descending
    pub entries: Vec<SectorEntry>,
    pub by_tier: BTreeMap<IntensityTier, usize>,
    pub by_signal: BTreeMap<SignalLabel, usize>,
    /// Members with no records in the table
    pub missing: Vec<String>,
}

pub struct SectorAggregator {
    analyzer: HorizonAnalyzer,
    detector: SignalDetector,
    scorer: SpikeScorer,
}

impl SectorAggregator {
    pub fn new(analyzer: HorizonAnalyzer, detector: SignalDetector, scorer: SpikeScorer) -> Self {
        Self {
            analyzer,
            detector,
            scorer,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            HorizonAnalyzer::default(),
            SignalDetector::with_defaults(),
            SpikeScorer::with_defaults(),
        )
    }

    /// Classify every member of the group. `members` pairs an instrument
    /// identifier with its display name.
    pub fn aggregate(&self, records: &[FeatureRecord], members: &[(&str, &str)]) -> SectorSummary {
        let mut entries = Vec::with_capacity(members.len());
        let mut missing = Vec::new();

        for (instrument, name) in members {
            let instrument = instrument.to_uppercase();
            let mut history: Vec<FeatureRecord> = records
                .iter()
                .filter(|r| r.instrument() == instrument)
                .cloned()
                .collect();
            history.sort_by_key(|r| r.date());

            let Some(stats) = self.analyzer.compute(&history) else {
                log::warn!("No data for {} ({}), skipping", instrument, name);
                missing.push(instrument);
                continue;
            };

            let (signal, tier) = self.detector.classify(stats.short.z_score, stats.long.z_score);
            let weighted_spike = self.scorer.compute_weighted_spike(&stats);

            let recent_spikes: Vec<f64> = history
                .iter()
                .rev()
                .filter_map(|r| r.spike_ratio)
                .take(AVG_SPIKE_ROWS)
                .collect();
            let avg_spike = if recent_spikes.is_empty() {
                None
            } else {
                Some(recent_spikes.iter().sum::<f64>() / recent_spikes.len() as f64)
            };

            entries.push(SectorEntry {
                name: name.to_string(),
                instrument,
                current_spike: history.last().and_then(|r| r.spike_ratio),
                stats,
                signal,
                tier,
                weighted_spike,
                avg_spike,
            });
        }

        entries.sort_by(|a, b| b.stats.short.z_score.total_cmp(&a.stats.short.z_score));

        let mut by_tier = BTreeMap::new();
        let mut by_signal = BTreeMap::new();
        for entry in &entries {
            *by_tier.entry(entry.tier).or_insert(0) += 1;
            *by_signal.entry(entry.signal).or_insert(0) += 1;
        }

        SectorSummary {
            entries,
            by_tier,
            by_signal,
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector_core::features::FeatureEngine;
    use crate::series::Observation;
    use chrono::{Duration, NaiveDate};

    fn observations(instrument: &str, volumes: &[u64]) -> Vec<Observation> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, v)| Observation {
                instrument: instrument.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i as i64),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: Some(*v),
            })
            .collect()
    }

    fn wobble(base: u64, len: usize) -> Vec<u64> {
        (0..len).map(|i| if i % 2 == 0 { base + 10 } else { base - 10 }).collect()
    }

    #[test]
    fn test_ranked_by_short_z() {
        let mut hot = wobble(1_000, 40);
        hot.push(5_000);
        let mut quiet = wobble(1_000, 40);
        quiet.push(400);
        let flat = wobble(1_000, 41);

        let mut input = observations("XLK", &hot);
        input.extend(observations("XLF", &quiet));
        input.extend(observations("XLE", &flat));
        let records = FeatureEngine::with_defaults().compute(&input);

        let summary = SectorAggregator::with_defaults().aggregate(
            &records,
            &[("XLF", "Financials"), ("XLE", "Energy"), ("XLK", "Technology"), ("XLU", "Utilities")],
        );

        let order: Vec<&str> = summary.entries.iter().map(|e| e.instrument.as_str()).collect();
        assert_eq!(order, vec!["XLK", "XLE", "XLF"]);
        assert_eq!(summary.missing, vec!["XLU".to_string()]);

        let top = &summary.entries[0];
        assert_eq!(top.name, "Technology");
        assert_eq!(top.signal, SignalLabel::Overheated);
        assert_eq!(top.tier, IntensityTier::Extreme);
        assert!(top.weighted_spike.unwrap() > 4.0);

        let bottom = &summary.entries[2];
        assert_eq!(bottom.tier, IntensityTier::Cold);

        assert_eq!(summary.by_signal.values().sum::<usize>(), 3);
        assert_eq!(summary.by_tier[&IntensityTier::Extreme], 1);
    }

    #[test]
    fn test_avg_spike_uses_last_five() {
        let volumes = vec![100, 100, 100, 100, 100, 100, 100, 100, 100, 100];
        let records = FeatureEngine::with_defaults().compute(&observations("XLP", &volumes));

        let summary = SectorAggregator::with_defaults().aggregate(&records, &[("XLP", "Consumer Staples")]);
        let entry = &summary.entries[0];

        assert_eq!(entry.avg_spike, Some(1.0));
        assert_eq!(entry.current_spike, Some(1.0));
        assert_eq!(entry.signal, SignalLabel::Neutral);
        assert_eq!(entry.tier, IntensityTier::Active);
    }
}
