//! Event extraction and event-level summaries
//!
//! An event is a feature record inside the recency window whose spike ratio
//! reaches the ALERT threshold. Events are recomputed on every pass.

use super::features::FeatureRecord;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spike-ratio ladder. Independent from the z-score intensity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    Extreme,
    High,
    Medium,
    Alert,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Extreme => "EXTREME",
            EventLevel::High => "HIGH",
            EventLevel::Medium => "MEDIUM",
            EventLevel::Alert => "ALERT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventThresholds {
    pub extreme: f64,
    pub high: f64,
    pub medium: f64,
    pub alert: f64,
}

impl Default for EventThresholds {
    fn default() -> Self {
        Self {
            extreme: 2.5,
            high: 2.0,
            medium: 1.5,
            alert: 1.3,
        }
    }
}

impl EventThresholds {
    /// Inclusive cut points, highest first. A missing or NaN ratio never
    /// classifies.
    pub fn classify(&self, spike_ratio: Option<f64>) -> Option<EventLevel> {
        let ratio = spike_ratio?;
        if ratio >= self.extreme {
            Some(EventLevel::Extreme)
        } else if ratio >= self.high {
            Some(EventLevel::High)
        } else if ratio >= self.medium {
            Some(EventLevel::Medium)
        } else if ratio >= self.alert {
            Some(EventLevel::Alert)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceDirection {
    Up,
    Down,
    Neutral,
}

impl PriceDirection {
    /// ±0.5% dead band around zero
    pub fn from_change_pct(change_pct: Option<f64>) -> Self {
        match change_pct {
            Some(c) if c > 0.5 => PriceDirection::Up,
            Some(c) if c < -0.5 => PriceDirection::Down,
            _ => PriceDirection::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    VolumeSpike,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeEvent {
    pub record: FeatureRecord,
    pub level: EventLevel,
    pub event_type: EventType,
    pub price_direction: PriceDirection,
    pub detected_at: DateTime<Utc>,
}

impl VolumeEvent {
    /// Materialize an event from a classified record
    pub fn from_record(record: &FeatureRecord, detected_at: DateTime<Utc>) -> Option<Self> {
        let level = record.event_level?;
        Some(Self {
            record: record.clone(),
            level,
            event_type: EventType::VolumeSpike,
            price_direction: PriceDirection::from_change_pct(
                record.observation.intraday_change_pct(),
            ),
            detected_at,
        })
    }

    pub fn instrument(&self) -> &str {
        self.record.instrument()
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    pub total_events: usize,
    pub by_level: BTreeMap<EventLevel, usize>,
    pub by_instrument: BTreeMap<String, usize>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub latest_events: Vec<VolumeEvent>,
}

pub struct EventExtractor {
    recent_days: i64,
    latest_limit: usize,
}

impl EventExtractor {
    pub fn new(recent_days: i64, latest_limit: usize) -> Self {
        Self {
            recent_days,
            latest_limit,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(30, 10)
    }

    /// First date inside the recency window, counted back in calendar days
    /// from the newest date of the whole table
    pub fn cutoff_date(&self, records: &[FeatureRecord]) -> Option<NaiveDate> {
        records
            .iter()
            .map(|r| r.date())
            .max()
            .map(|max| max - Duration::days(self.recent_days))
    }

    pub fn detect_events(
        &self,
        records: &[FeatureRecord],
        detected_at: DateTime<Utc>,
    ) -> Vec<VolumeEvent> {
        let Some(cutoff) = self.cutoff_date(records) else {
            return Vec::new();
        };

        let events: Vec<VolumeEvent> = records
            .iter()
            .filter(|r| r.date() >= cutoff)
            .filter_map(|r| VolumeEvent::from_record(r, detected_at))
            .collect();

        log::info!(
            "Detected {} volume events (last {} days)",
            events.len(),
            self.recent_days
        );
        events
    }

    pub fn summarize(&self, events: &[VolumeEvent]) -> EventSummary {
        let mut by_level = BTreeMap::new();
        let mut by_instrument = BTreeMap::new();
        for event in events {
            *by_level.entry(event.level).or_insert(0) += 1;
            *by_instrument.entry(event.instrument().to_string()).or_insert(0) += 1;
        }

        let date_range = match (
            events.iter().map(|e| e.date()).min(),
            events.iter().map(|e| e.date()).max(),
        ) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };

        EventSummary {
            total_events: events.len(),
            by_level,
            by_instrument,
            date_range,
            latest_events: latest_events(events, self.latest_limit),
        }
    }
}

/// Newest first; equal dates keep their insertion order
pub fn latest_events(events: &[VolumeEvent], limit: usize) -> Vec<VolumeEvent> {
    let mut sorted: Vec<&VolumeEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.date().cmp(&a.date()));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Records with the largest spike ratios, ties in input row order
pub fn top_spikes(
    records: &[FeatureRecord],
    top_n: usize,
    min_date: Option<NaiveDate>,
) -> Vec<FeatureRecord> {
    let mut candidates: Vec<(&FeatureRecord, f64)> = records
        .iter()
        .filter(|r| min_date.map_or(true, |min| r.date() >= min))
        .filter_map(|r| r.spike_ratio.filter(|s| s.is_finite()).map(|s| (r, s)))
        .collect();

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates
        .into_iter()
        .take(top_n)
        .map(|(r, _)| r.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Observation;

    fn record(instrument: &str, day: u32, spike: Option<f64>) -> FeatureRecord {
        FeatureRecord {
            observation: Observation {
                instrument: instrument.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 98.0,
                close: 101.0,
                volume: Some(1_000),
            },
            volume_ma: spike.map(|_| 1_000.0),
            spike_ratio: spike,
            volume_change_pct: None,
            price_change_pct: None,
            event_level: EventThresholds::default().classify(spike),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-31T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_ladder_boundaries() {
        let t = EventThresholds::default();

        assert_eq!(t.classify(Some(2.5)), Some(EventLevel::Extreme));
        assert_eq!(t.classify(Some(2.4999)), Some(EventLevel::High));
        assert_eq!(t.classify(Some(2.0)), Some(EventLevel::High));
        assert_eq!(t.classify(Some(1.9999)), Some(EventLevel::Medium));
        assert_eq!(t.classify(Some(1.5)), Some(EventLevel::Medium));
        assert_eq!(t.classify(Some(1.4999)), Some(EventLevel::Alert));
        assert_eq!(t.classify(Some(1.3)), Some(EventLevel::Alert));
        assert_eq!(t.classify(Some(1.29999)), None);
        assert_eq!(t.classify(None), None);
        assert_eq!(t.classify(Some(f64::NAN)), None);
    }

    #[test]
    fn test_price_direction_dead_band() {
        assert_eq!(PriceDirection::from_change_pct(Some(0.51)), PriceDirection::Up);
        assert_eq!(PriceDirection::from_change_pct(Some(0.5)), PriceDirection::Neutral);
        assert_eq!(PriceDirection::from_change_pct(Some(-0.5)), PriceDirection::Neutral);
        assert_eq!(PriceDirection::from_change_pct(Some(-0.51)), PriceDirection::Down);
        assert_eq!(PriceDirection::from_change_pct(None), PriceDirection::Neutral);
    }

    #[test]
    fn test_detect_events_respects_recency_window() {
        let records = vec![
            record("XLK", 1, Some(3.0)),
            record("XLK", 20, Some(1.3)),
            record("XLK", 31, Some(1.1)),
            record("XLF", 2, Some(2.1)),
            record("XLF", 31, None),
        ];

        let extractor = EventExtractor::new(10, 10);
        let events = extractor.detect_events(&records, now());

        // cutoff is 2024-03-21
        assert!(events.is_empty());

        let extractor = EventExtractor::new(29, 10);
        let events = extractor.detect_events(&records, now());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, EventLevel::Alert);
        assert_eq!(events[1].instrument(), "XLF");
        assert_eq!(events[1].level, EventLevel::High);
        assert_eq!(events[1].price_direction, PriceDirection::Up);
        assert_eq!(events[1].detected_at, now());
    }

    #[test]
    fn test_summary_counts_and_latest() {
        let records = vec![
            record("XLK", 3, Some(2.6)),
            record("XLK", 9, Some(1.4)),
            record("XLF", 9, Some(1.6)),
            record("XLF", 5, Some(2.7)),
        ];
        let extractor = EventExtractor::new(30, 3);
        let events = extractor.detect_events(&records, now());
        let summary = extractor.summarize(&events);

        assert_eq!(summary.total_events, 4);
        assert_eq!(summary.by_level[&EventLevel::Extreme], 2);
        assert_eq!(summary.by_level[&EventLevel::Alert], 1);
        assert_eq!(summary.by_instrument["XLF"], 2);
        assert_eq!(
            summary.date_range,
            Some((
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
            ))
        );

        let latest: Vec<(&str, u32)> = summary
            .latest_events
            .iter()
            .map(|e| (e.instrument(), chrono::Datelike::day(&e.date())))
            .collect();
        assert_eq!(latest, vec![("XLK", 9), ("XLF", 9), ("XLF", 5)]);
    }

    #[test]
    fn test_empty_summary() {
        let summary = EventExtractor::with_defaults().summarize(&[]);
        assert_eq!(summary.total_events, 0);
        assert!(summary.by_level.is_empty());
        assert_eq!(summary.date_range, None);
        assert!(summary.latest_events.is_empty());
    }

    #[test]
    fn test_top_spikes_stable_and_filtered() {
        let records = vec![
            record("XLK", 1, Some(5.0)),
            record("XLK", 10, Some(2.0)),
            record("XLF", 10, Some(3.0)),
            record("XLF", 11, None),
            record("XLE", 12, Some(2.0)),
            record("XLE", 13, Some(0.4)),
        ];

        let top = top_spikes(&records, 3, NaiveDate::from_ymd_opt(2024, 3, 5));
        let picked: Vec<(&str, Option<f64>)> =
            top.iter().map(|r| (r.instrument(), r.spike_ratio)).collect();

        assert_eq!(
            picked,
            vec![("XLF", Some(3.0)), ("XLK", Some(2.0)), ("XLE", Some(2.0))]
        );
        assert_eq!(top_spikes(&records, 10, None).len(), 5);
    }
}
