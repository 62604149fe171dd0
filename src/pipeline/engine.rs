//! Analysis Context - orchestration of fetch → features → statistics → output
//!
//! ## Architecture
//!
//! ```text
//! AnalysisContext::run_full_analysis() / quick_scan() / sector_summary() / ticker_detail()
//!     ↓
//! fetch_batch (through the TTL cache, skip-and-continue)
//!     ↓
//! SeriesStore → FeatureEngine
//!     ↓
//! EventExtractor / TickerAnalyzer / SectorAggregator
//!     ↓
//! AnalysisResponse (single output boundary)
//! ```
//!
//! The context is built by the caller and passed by reference. Fetching is
//! the only async step; everything after it runs synchronously to completion.
//! Operations never return `Err`: failures become `AnalysisResponse::Error`.

use super::cache::{CachedSource, SeriesCache};
use super::config::AnalysisConfig;
use super::source::{fetch_batch, BatchFetch, DataSource, FetchRange};
use super::universe::{self, UniverseGroup, QUICK_SCAN_ETFS};
use crate::detector_core::{
    top_spikes, EventExtractor, FeatureEngine, FeatureRecord, HorizonAnalyzer, SectorAggregator,
    SignalDetector, SpikeScorer, TickerAnalyzer,
};
use crate::error::AnalysisError;
use crate::output::response::{
    AnalysisMetadata, EventSummaryView, FullAnalysisResult, QuickScanEntry, QuickScanResult,
    SectorSummaryResult, SpikeView, TickerAnalysisView, TickerDetailResult, VERSION,
};
use crate::output::AnalysisResponse;
use crate::series::SeriesStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Events listed per instrument in the full analysis
const RECENT_EVENTS_PER_INSTRUMENT: usize = 5;

pub struct AnalysisContext {
    config: AnalysisConfig,

    /// Upstream series provider
    source: Arc<dyn DataSource>,

    /// Advisory read-through cache of fetched series
    cache: SeriesCache,

    /// Timestamp function (for testing with mock time)
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl AnalysisContext {
    /// Create a context using system time
    pub fn new(config: AnalysisConfig, source: Arc<dyn DataSource>) -> Self {
        Self::new_with_timestamp_fn(config, source, Box::new(|| Utc::now().timestamp()))
    }

    /// Create a context with a custom timestamp function
    ///
    /// Used for testing with deterministic timestamps and cache expiry.
    ///
    /// # Arguments
    /// * `now_fn` - Function returning Unix timestamp (for testing)
    pub fn new_with_timestamp_fn(
        config: AnalysisConfig,
        source: Arc<dyn DataSource>,
        now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
    ) -> Self {
        let cache = SeriesCache::new(config.cache_ttl_secs);
        Self {
            config,
            source,
            cache,
            now_fn,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp((self.now_fn)(), 0).unwrap_or_default()
    }

    fn range(&self, period: Option<&str>) -> Result<FetchRange, AnalysisError> {
        FetchRange::period(period.unwrap_or(&self.config.default_period))
    }

    fn feature_engine(&self) -> FeatureEngine {
        FeatureEngine::new(self.config.ma_period, self.config.thresholds)
    }

    async fn fetch(&self, instruments: &[String], range: &FetchRange) -> Result<BatchFetch, AnalysisError> {
        let source = CachedSource::new(self.source.as_ref(), &self.cache, (self.now_fn)());
        fetch_batch(&source, instruments, range).await
    }

    /// Fetch and compute feature records for a batch
    async fn load(
        &self,
        instruments: &[String],
        range: &FetchRange,
    ) -> Result<(BatchFetch, SeriesStore, Vec<FeatureRecord>), AnalysisError> {
        let mut batch = self.fetch(instruments, range).await?;

        let mut store = SeriesStore::new();
        let duplicates = store.extend(std::mem::take(&mut batch.observations));
        if duplicates > 0 {
            log::warn!("⚠️  Dropped {} duplicate observations", duplicates);
        }

        let records = self.feature_engine().compute_store(&store);
        log::info!(
            "📊 Computed {} feature records for {} instruments ({})",
            records.len(),
            batch.fetched.len(),
            range.key()
        );

        Ok((batch, store, records))
    }

    fn respond<T>(
        &self,
        operation: &str,
        result: Result<T, AnalysisError>,
        wrap: impl FnOnce(T) -> AnalysisResponse,
    ) -> AnalysisResponse {
        match result {
            Ok(value) => wrap(value),
            Err(e) => {
                log::error!("❌ {} failed: {}", operation, e);
                AnalysisResponse::error(&e, self.now())
            }
        }
    }

    /// Full pipeline over a list of instruments
    ///
    /// Defaults to the market indices plus the sector ETFs and the
    /// configured default period.
    pub async fn run_full_analysis(
        &self,
        tickers: Option<Vec<String>>,
        period: Option<&str>,
    ) -> AnalysisResponse {
        let result = self.try_full_analysis(tickers, period).await;
        self.respond("Full analysis", result, AnalysisResponse::FullAnalysis)
    }

    async fn try_full_analysis(
        &self,
        tickers: Option<Vec<String>>,
        period: Option<&str>,
    ) -> Result<FullAnalysisResult, AnalysisError> {
        let range = self.range(period)?;
        let requested: Vec<String> = tickers
            .unwrap_or_else(|| universe::all_etfs().iter().map(|(id, _)| id.to_string()).collect())
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();

        log::info!("🚀 Full analysis: {} instruments, period {}", requested.len(), range.key());

        let (batch, store, records) = self.load(&requested, &range).await?;
        let now = self.now();

        let extractor = EventExtractor::new(self.config.event_history_days, self.config.latest_events);
        let events = extractor.detect_events(&records, now);
        let summary = extractor.summarize(&events);

        let spikes = top_spikes(&records, self.config.top_spikes, extractor.cutoff_date(&records));

        // instruments with events, in order of first appearance
        let mut event_instruments: Vec<&str> = Vec::new();
        for event in &events {
            if !event_instruments.contains(&event.instrument()) {
                event_instruments.push(event.instrument());
            }
        }
        event_instruments.truncate(self.config.max_ticker_analyses);

        let analyzer = TickerAnalyzer::new(self.config.ticker_lookback, RECENT_EVENTS_PER_INSTRUMENT);
        let ticker_analysis: BTreeMap<String, TickerAnalysisView> = event_instruments
            .iter()
            .filter_map(|instrument| analyzer.analyze(&records, instrument, now))
            .map(|a| (a.instrument.clone(), TickerAnalysisView::from_analysis(&a)))
            .collect();

        let universe_names: BTreeMap<String, String> = batch
            .fetched
            .iter()
            .map(|id| (id.clone(), universe::label(id)))
            .collect();

        log::info!(
            "✅ Full analysis complete: {} rows, {} events, {} instrument analyses",
            store.len(),
            summary.total_events,
            ticker_analysis.len()
        );

        Ok(FullAnalysisResult {
            metadata: AnalysisMetadata {
                timestamp: now,
                period: range.key(),
                instruments_requested: requested,
                instruments_analyzed: batch.fetched.clone(),
                data_rows: store.len(),
                date_range: store.date_range().map(Into::into),
                version: VERSION.to_string(),
                skipped: batch.skipped,
            },
            summary: EventSummaryView::from_summary(&summary),
            top_spikes: spikes.iter().map(SpikeView::from_record).collect(),
            ticker_analysis,
            universe: universe_names,
        })
    }

    /// Latest snapshot per instrument over the quick-scan period
    pub async fn quick_scan(&self, tickers: Option<Vec<String>>) -> AnalysisResponse {
        let result = self.try_quick_scan(tickers).await;
        self.respond("Quick scan", result, AnalysisResponse::QuickScan)
    }

    async fn try_quick_scan(&self, tickers: Option<Vec<String>>) -> Result<QuickScanResult, AnalysisError> {
        let range = FetchRange::period(&self.config.quick_scan_period)?;
        let requested = tickers
            .unwrap_or_else(|| QUICK_SCAN_ETFS.iter().map(|t| t.to_string()).collect());

        log::info!("⚡ Quick scan: {} instruments", requested.len());

        let (batch, _store, records) = self.load(&requested, &range).await?;

        let data = batch
            .fetched
            .iter()
            .filter_map(|instrument| {
                records
                    .iter()
                    .filter(|r| r.instrument() == instrument.as_str())
                    .max_by_key(|r| r.date())
            })
            .map(QuickScanEntry::from_record)
            .collect();

        Ok(QuickScanResult {
            timestamp: self.now(),
            period: range.key(),
            data,
            skipped: batch.skipped,
        })
    }

    /// Multi-horizon classification of every member of a universe group
    pub async fn sector_summary(&self, group: &str, period: Option<&str>) -> AnalysisResponse {
        let result = self.try_sector_summary(group, period).await;
        self.respond("Sector summary", result, AnalysisResponse::SectorSummary)
    }

    async fn try_sector_summary(
        &self,
        group: &str,
        period: Option<&str>,
    ) -> Result<SectorSummaryResult, AnalysisError> {
        let group = UniverseGroup::from_str(group)
            .ok_or_else(|| AnalysisError::InvalidRequest(format!("unknown group '{}'", group)))?;
        let range = self.range(period)?;
        let members = group.members();
        let instruments: Vec<String> = members.iter().map(|(id, _)| id.to_string()).collect();

        log::info!("🧭 Sector summary: {} ({} members)", group.as_str(), members.len());

        let (batch, _store, records) = self.load(&instruments, &range).await?;

        let aggregator = SectorAggregator::new(
            HorizonAnalyzer::new(self.config.horizons),
            SignalDetector::with_defaults(),
            SpikeScorer::new(self.config.weights),
        );
        let mut summary = aggregator.aggregate(&records, &members);
        // failed fetches are reported once, under skipped
        summary
            .missing
            .retain(|id| !batch.skipped.iter().any(|s| s.instrument == *id));

        Ok(SectorSummaryResult::from_summary(
            &summary,
            group.as_str(),
            &range.key(),
            batch.skipped,
            self.now(),
        ))
    }

    /// Full history, all events and the latest snapshot of one instrument
    pub async fn ticker_detail(&self, instrument: &str, period: Option<&str>) -> AnalysisResponse {
        let result = self.try_ticker_detail(instrument, period).await;
        self.respond("Ticker detail", result, AnalysisResponse::TickerDetail)
    }

    async fn try_ticker_detail(
        &self,
        instrument: &str,
        period: Option<&str>,
    ) -> Result<TickerDetailResult, AnalysisError> {
        let instrument = instrument.trim().to_uppercase();
        if instrument.is_empty() {
            return Err(AnalysisError::InvalidRequest("no instrument given".to_string()));
        }
        let range = self.range(period)?;

        let (_batch, _store, records) = match self.load(&[instrument.clone()], &range).await {
            Ok(loaded) => loaded,
            Err(AnalysisError::EmptyBatch { .. }) => {
                return Err(AnalysisError::UnknownInstrument(instrument))
            }
            Err(e) => return Err(e),
        };

        let now = self.now();
        let detail = TickerAnalyzer::new(self.config.ticker_lookback, RECENT_EVENTS_PER_INSTRUMENT)
            .detail(&records, &instrument, now)
            .ok_or_else(|| AnalysisError::UnknownInstrument(instrument.clone()))?;

        Ok(TickerDetailResult::from_detail(&detail, &range.key(), now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Observation;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};

    /// Serves a flat series with one spike on the last day for any
    /// instrument except "MISSING"
    struct FlatSource;

    #[async_trait]
    impl DataSource for FlatSource {
        async fn fetch(
            &self,
            instrument: &str,
            _range: &FetchRange,
        ) -> Result<Vec<Observation>, AnalysisError> {
            if instrument == "MISSING" {
                return Err(AnalysisError::upstream(instrument, "404 Not Found"));
            }
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok((0..30)
                .map(|i| Observation {
                    instrument: instrument.to_string(),
                    date: start + Duration::days(i),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.5,
                    volume: Some(if i == 29 { 5_000 } else { 1_000 }),
                })
                .collect())
        }
    }

    fn context() -> AnalysisContext {
        let base_time = 1_706_000_000;
        AnalysisContext::new_with_timestamp_fn(
            AnalysisConfig::default(),
            Arc::new(FlatSource),
            Box::new(move || base_time),
        )
    }

    #[tokio::test]
    async fn test_invalid_period_is_bad_request() {
        let response = context().run_full_analysis(None, Some("7w")).await;
        match response {
            AnalysisResponse::Error(e) => assert_eq!(e.status, 400),
            other => panic!("expected error, got {}", other.mode()),
        }
    }

    #[tokio::test]
    async fn test_unknown_group_is_bad_request() {
        let response = context().sector_summary("crypto", None).await;
        match response {
            AnalysisResponse::Error(e) => {
                assert_eq!(e.status, 400);
                assert!(e.message.contains("crypto"));
            }
            other => panic!("expected error, got {}", other.mode()),
        }
    }

    #[tokio::test]
    async fn test_ticker_detail_unknown_instrument() {
        let response = context().ticker_detail("missing", None).await;
        match response {
            AnalysisResponse::Error(e) => assert_eq!(e.status, 404),
            other => panic!("expected error, got {}", other.mode()),
        }
    }

    #[tokio::test]
    async fn test_ticker_detail() {
        let response = context().ticker_detail("xlk", Some("1mo")).await;
        let AnalysisResponse::TickerDetail(detail) = response else {
            panic!("expected ticker detail");
        };

        assert_eq!(detail.instrument, "XLK");
        assert_eq!(detail.name, "Technology");
        assert_eq!(detail.period, "1mo");
        assert_eq!(detail.history.len(), 30);
        assert_eq!(detail.events.len(), 1);
        assert_eq!(detail.latest.volume, Some(5_000));
        assert_eq!(detail.latest.price_change, Some(0.0));
    }

    #[tokio::test]
    async fn test_sector_summary_ranks_members() {
        let response = context().sector_summary("indices", None).await;
        let AnalysisResponse::SectorSummary(summary) = response else {
            panic!("expected sector summary");
        };

        assert_eq!(summary.group, "indices");
        assert_eq!(summary.total_sectors, 3);
        assert!(summary.missing.is_empty());
        // identical flat history with zero variance before the spike
        assert!(summary.sectors.iter().all(|s| s.short_zscore == Some(0.0)));
    }
}
