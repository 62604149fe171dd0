//! Analysis responses
//!
//! `AnalysisResponse` is the only thing an analysis operation returns. It is
//! internally tagged by `"mode"`. The `from_*` constructors are the single
//! place where domain values are turned into output values; every float goes
//! through `shape`.

use super::shape::{correlation, num, num_opt};
use crate::detector_core::events::EventType;
use crate::detector_core::{
    EventLevel, EventSummary, FeatureRecord, IntensityTier, PriceDirection, SectorEntry,
    SectorSummary, SignalLabel, TickerAnalysis, TickerDetail, VolumeEvent,
};
use crate::error::AnalysisError;
use crate::pipeline::source::SkippedInstrument;
use crate::pipeline::universe;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const VERSION: &str = "0.2.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisResponse {
    FullAnalysis(FullAnalysisResult),
    QuickScan(QuickScanResult),
    SectorSummary(SectorSummaryResult),
    TickerDetail(TickerDetailResult),
    Error(ErrorResult),
}

impl AnalysisResponse {
    pub fn error(err: &AnalysisError, timestamp: DateTime<Utc>) -> Self {
        AnalysisResponse::Error(ErrorResult {
            error: true,
            message: err.to_string(),
            timestamp,
            status: err.status_code(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResponse::Error(_))
    }

    pub fn mode(&self) -> &'static str {
        match self {
            AnalysisResponse::FullAnalysis(_) => "full_analysis",
            AnalysisResponse::QuickScan(_) => "quick_scan",
            AnalysisResponse::SectorSummary(_) => "sector_summary",
            AnalysisResponse::TickerDetail(_) => "ticker_detail",
            AnalysisResponse::Error(_) => "error",
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
    pub error: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// HTTP-equivalent status
    pub status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<(NaiveDate, NaiveDate)> for DateRange {
    fn from((start, end): (NaiveDate, NaiveDate)) -> Self {
        Self { start, end }
    }
}

// ---------------------------------------------------------------------------
// Shared views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    pub instrument: String,
    pub name: String,
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub volume_ma: Option<f64>,
    pub spike_ratio: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub level: EventLevel,
    pub event_type: EventType,
    pub price_direction: PriceDirection,
    pub detected_at: DateTime<Utc>,
}

impl EventView {
    pub fn from_event(event: &VolumeEvent) -> Self {
        let r = &event.record;
        Self {
            instrument: r.instrument().to_string(),
            name: universe::label(r.instrument()),
            date: r.date(),
            close: num(r.observation.close),
            volume: r.observation.volume,
            volume_ma: num_opt(r.volume_ma),
            spike_ratio: num_opt(r.spike_ratio),
            price_change_pct: num_opt(r.price_change_pct),
            level: event.level,
            event_type: event.event_type,
            price_direction: event.price_direction,
            detected_at: event.detected_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeView {
    pub instrument: String,
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub volume_ma: Option<f64>,
    pub spike_ratio: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub event_level: Option<EventLevel>,
}

impl SpikeView {
    pub fn from_record(r: &FeatureRecord) -> Self {
        Self {
            instrument: r.instrument().to_string(),
            date: r.date(),
            close: num(r.observation.close),
            volume: r.observation.volume,
            volume_ma: num_opt(r.volume_ma),
            spike_ratio: num_opt(r.spike_ratio),
            price_change_pct: num_opt(r.price_change_pct),
            event_level: r.event_level,
        }
    }
}

// ---------------------------------------------------------------------------
// Full analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    pub timestamp: DateTime<Utc>,
    pub period: String,
    pub instruments_requested: Vec<String>,
    pub instruments_analyzed: Vec<String>,
    pub data_rows: usize,
    pub date_range: Option<DateRange>,
    pub version: String,
    pub skipped: Vec<SkippedInstrument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummaryView {
    pub total_events: usize,
    pub by_level: BTreeMap<EventLevel, usize>,
    pub by_instrument: BTreeMap<String, usize>,
    pub date_range: Option<DateRange>,
    pub latest_events: Vec<EventView>,
}

impl EventSummaryView {
    pub fn from_summary(summary: &EventSummary) -> Self {
        Self {
            total_events: summary.total_events,
            by_level: summary.by_level.clone(),
            by_instrument: summary.by_instrument.clone(),
            date_range: summary.date_range.map(DateRange::from),
            latest_events: summary.latest_events.iter().map(EventView::from_event).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerAnalysisView {
    pub instrument: String,
    pub name: String,
    pub current_date: NaiveDate,
    pub current_price: Option<f64>,
    pub current_volume: Option<u64>,
    pub avg_volume: Option<f64>,
    pub volume_ma: Option<f64>,
    pub spike_ratio: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub lookback: usize,
    pub event_count: usize,
    pub volume_price_correlation: Option<f64>,
    pub recent_events: Vec<EventView>,
}

impl TickerAnalysisView {
    pub fn from_analysis(a: &TickerAnalysis) -> Self {
        Self {
            instrument: a.instrument.clone(),
            name: universe::label(&a.instrument),
            current_date: a.current_date,
            current_price: num(a.current_price),
            current_volume: a.current_volume,
            avg_volume: num_opt(a.avg_volume),
            volume_ma: num_opt(a.volume_ma),
            spike_ratio: num_opt(a.spike_ratio),
            price_change_pct: num_opt(a.price_change_pct),
            lookback: a.lookback,
            event_count: a.event_count,
            volume_price_correlation: correlation(a.volume_price_correlation),
            recent_events: a.recent_events.iter().map(EventView::from_event).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullAnalysisResult {
    pub metadata: AnalysisMetadata,
    pub summary: EventSummaryView,
    pub top_spikes: Vec<SpikeView>,
    /// Keyed by instrument
    pub ticker_analysis: BTreeMap<String, TickerAnalysisView>,
    /// Display names of the analyzed instruments
    pub universe: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Quick scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickScanEntry {
    pub instrument: String,
    pub name: String,
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub volume: Option<u64>,
    pub spike_ratio: Option<f64>,
    pub price_change_pct: Option<f64>,
}

impl QuickScanEntry {
    pub fn from_record(r: &FeatureRecord) -> Self {
        Self {
            instrument: r.instrument().to_string(),
            name: universe::label(r.instrument()),
            date: r.date(),
            price: num(r.observation.close),
            volume: r.observation.volume,
            spike_ratio: num_opt(r.spike_ratio),
            price_change_pct: num_opt(r.price_change_pct),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickScanResult {
    pub timestamp: DateTime<Utc>,
    pub period: String,
    pub data: Vec<QuickScanEntry>,
    pub skipped: Vec<SkippedInstrument>,
}

// ---------------------------------------------------------------------------
// Sector summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorView {
    pub sector: String,
    pub instrument: String,
    pub date: NaiveDate,
    pub current_volume: Option<u64>,
    pub short_zscore: Option<f64>,
    pub medium_zscore: Option<f64>,
    pub long_zscore: Option<f64>,
    pub short_spike: Option<f64>,
    pub medium_spike: Option<f64>,
    pub long_spike: Option<f64>,
    pub percentile: Option<f64>,
    pub signal: SignalLabel,
    pub status: IntensityTier,
    pub avg_spike: Option<f64>,
    pub weighted_spike: Option<f64>,
    pub current_spike: Option<f64>,
}

impl SectorView {
    pub fn from_entry(e: &SectorEntry) -> Self {
        Self {
            sector: e.name.clone(),
            instrument: e.instrument.clone(),
            date: e.stats.date,
            current_volume: e.stats.current_volume,
            short_zscore: num(e.stats.short.z_score),
            medium_zscore: num(e.stats.medium.z_score),
            long_zscore: num(e.stats.long.z_score),
            short_spike: num_opt(e.stats.short.spike_ratio),
            medium_spike: num_opt(e.stats.medium.spike_ratio),
            long_spike: num_opt(e.stats.long.spike_ratio),
            percentile: num_opt(e.stats.percentile),
            signal: e.signal,
            status: e.tier,
            avg_spike: num_opt(e.avg_spike),
            weighted_spike: num_opt(e.weighted_spike),
            current_spike: num_opt(e.current_spike),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSummaryResult {
    pub timestamp: DateTime<Utc>,
    pub group: String,
    pub period: String,
    pub total_sectors: usize,
    /// extreme + hot
    pub hot_sectors: usize,
    /// warm + active
    pub warm_sectors: usize,
    /// cool + cold
    pub cold_sectors: usize,
    pub by_tier: BTreeMap<IntensityTier, usize>,
    pub signals: BTreeMap<SignalLabel, usize>,
    pub sectors: Vec<SectorView>,
    pub missing: Vec<String>,
    pub skipped: Vec<SkippedInstrument>,
}

impl SectorSummaryResult {
    pub fn from_summary(
        summary: &SectorSummary,
        group: &str,
        period: &str,
        skipped: Vec<SkippedInstrument>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let count = |tiers: &[IntensityTier]| -> usize {
            tiers
                .iter()
                .map(|t| summary.by_tier.get(t).copied().unwrap_or(0))
                .sum()
        };

        Self {
            timestamp,
            group: group.to_string(),
            period: period.to_string(),
            total_sectors: summary.entries.len(),
            hot_sectors: count(&[IntensityTier::Extreme, IntensityTier::Hot]),
            warm_sectors: count(&[IntensityTier::Warm, IntensityTier::Active]),
            cold_sectors: count(&[IntensityTier::Cool, IntensityTier::Cold]),
            by_tier: summary.by_tier.clone(),
            signals: summary.by_signal.clone(),
            sectors: summary.entries.iter().map(SectorView::from_entry).collect(),
            missing: summary.missing.clone(),
            skipped,
        }
    }
}

// ---------------------------------------------------------------------------
// Ticker detail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub volume_ma: Option<f64>,
    pub spike_ratio: Option<f64>,
    pub event_level: Option<EventLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestView {
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub volume: Option<u64>,
    pub spike_ratio: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerDetailResult {
    pub timestamp: DateTime<Utc>,
    pub instrument: String,
    pub name: String,
    pub period: String,
    pub latest: LatestView,
    pub history: Vec<HistoryPoint>,
    pub events: Vec<EventView>,
}

impl TickerDetailResult {
    pub fn from_detail(detail: &TickerDetail, period: &str, timestamp: DateTime<Utc>) -> Self {
        let latest = &detail.latest;
        Self {
            timestamp,
            instrument: detail.instrument.clone(),
            name: universe::label(&detail.instrument),
            period: period.to_string(),
            latest: LatestView {
                date: latest.date,
                price: num(latest.price),
                volume: latest.volume,
                spike_ratio: num_opt(latest.spike_ratio),
                price_change: num_opt(latest.price_change),
                price_change_pct: num_opt(latest.price_change_pct),
            },
            history: detail
                .history
                .iter()
                .map(|r| HistoryPoint {
                    date: r.date(),
                    open: num(r.observation.open),
                    high: num(r.observation.high),
                    low: num(r.observation.low),
                    close: num(r.observation.close),
                    volume: r.observation.volume,
                    volume_ma: num_opt(r.volume_ma),
                    spike_ratio: num_opt(r.spike_ratio),
                    event_level: r.event_level,
                })
                .collect(),
            events: detail.events.iter().map(EventView::from_event).collect(),
        }
    }
}
