//! Data Source - upstream boundary for daily observations
//!
//! A `DataSource` returns one instrument's daily series for a `FetchRange`.
//! `fetch_batch` runs a list of instruments through a source, skipping the
//! ones that fail and failing only when nothing could be fetched.

use crate::error::AnalysisError;
use crate::series::Observation;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Lookback periods understood by every source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "5d" => Some(Period::FiveDays),
            "1mo" => Some(Period::OneMonth),
            "3mo" => Some(Period::ThreeMonths),
            "6mo" => Some(Period::SixMonths),
            "1y" => Some(Period::OneYear),
            "2y" => Some(Period::TwoYears),
            "5y" => Some(Period::FiveYears),
            "10y" => Some(Period::TenYears),
            "ytd" => Some(Period::YearToDate),
            "max" => Some(Period::Max),
            _ => None,
        }
    }

    pub fn all() -> [Period; 10] {
        [
            Period::FiveDays,
            Period::OneMonth,
            Period::ThreeMonths,
            Period::SixMonths,
            Period::OneYear,
            Period::TwoYears,
            Period::FiveYears,
            Period::TenYears,
            Period::YearToDate,
            Period::Max,
        ]
    }

    /// First calendar date covered when the period ends on `anchor`.
    /// None for `Max`. Five days spans one calendar week.
    pub fn start_from(&self, anchor: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            Period::FiveDays => 6,
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1826,
            Period::TenYears => 3652,
            Period::YearToDate => return NaiveDate::from_ymd_opt(anchor.year(), 1, 1),
            Period::Max => return None,
        };
        Some(anchor - Duration::days(days))
    }
}

/// What to fetch for each instrument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchRange {
    /// Trailing period ending at the latest available date
    Period(Period),
    /// Explicit inclusive date range
    Dates { start: NaiveDate, end: NaiveDate },
}

impl FetchRange {
    /// Parse a period string such as `1y` or `5d`
    pub fn period(s: &str) -> Result<Self, AnalysisError> {
        Period::from_str(s)
            .map(FetchRange::Period)
            .ok_or_else(|| AnalysisError::InvalidRequest(format!("unknown period '{}'", s)))
    }

    pub fn dates(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalysisError> {
        if start > end {
            return Err(AnalysisError::InvalidRequest(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(FetchRange::Dates { start, end })
    }

    /// Cache key component; distinct ranges never share a key
    pub fn key(&self) -> String {
        match self {
            FetchRange::Period(p) => p.as_str().to_string(),
            FetchRange::Dates { start, end } => format!("{}_{}", start, end),
        }
    }

    /// Keep the observations inside the range. `Period` ranges are anchored
    /// on the newest date present in `observations`.
    pub fn filter(&self, mut observations: Vec<Observation>) -> Vec<Observation> {
        match self {
            FetchRange::Dates { start, end } => {
                observations.retain(|o| o.date >= *start && o.date <= *end);
            }
            FetchRange::Period(period) => {
                let start = observations
                    .iter()
                    .map(|o| o.date)
                    .max()
                    .and_then(|anchor| period.start_from(anchor));
                if let Some(start) = start {
                    observations.retain(|o| o.date >= start);
                }
            }
        }
        observations
    }
}

/// Upstream provider of daily observations
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Daily series of one instrument, ascending by date
    ///
    /// An empty series is an error: callers treat "no rows" the same as a
    /// failed request.
    async fn fetch(
        &self,
        instrument: &str,
        range: &FetchRange,
    ) -> Result<Vec<Observation>, AnalysisError>;
}

/// Instrument dropped from a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedInstrument {
    pub instrument: String,
    pub reason: String,
}

/// Outcome of a batch fetch with at least one surviving instrument
#[derive(Debug, Clone)]
pub struct BatchFetch {
    pub observations: Vec<Observation>,
    /// Instruments that returned data, in request order
    pub fetched: Vec<String>,
    pub skipped: Vec<SkippedInstrument>,
}

/// Fetch every instrument, skipping the ones that fail
///
/// Instruments are normalized to upper case and de-duplicated. Returns
/// `EmptyBatch` when the list is non-empty and every fetch failed, and
/// `InvalidRequest` when the list is empty.
pub async fn fetch_batch(
    source: &dyn DataSource,
    instruments: &[String],
    range: &FetchRange,
) -> Result<BatchFetch, AnalysisError> {
    let mut requested: Vec<String> = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        let instrument = instrument.trim().to_uppercase();
        if !instrument.is_empty() && !requested.contains(&instrument) {
            requested.push(instrument);
        }
    }

    if requested.is_empty() {
        return Err(AnalysisError::InvalidRequest(
            "no instruments requested".to_string(),
        ));
    }

    let mut observations = Vec::new();
    let mut fetched = Vec::new();
    let mut skipped = Vec::new();

    for instrument in &requested {
        let result = match source.fetch(instrument, range).await {
            Ok(rows) if rows.is_empty() => Err(AnalysisError::upstream(instrument, "no rows returned")),
            other => other,
        };

        match result {
            Ok(rows) => {
                log::debug!("Fetched {}: {} rows", instrument, rows.len());
                observations.extend(rows);
                fetched.push(instrument.clone());
            }
            Err(e) => {
                log::warn!("⚠️  Skipping {}: {}", instrument, e);
                let reason = match e {
                    AnalysisError::UpstreamFetch { reason, .. } => reason,
                    other => other.to_string(),
                };
                skipped.push(SkippedInstrument {
                    instrument: instrument.clone(),
                    reason,
                });
            }
        }
    }

    if fetched.is_empty() {
        return Err(AnalysisError::EmptyBatch { requested });
    }

    if !skipped.is_empty() {
        log::warn!(
            "Skipped {} of {} instruments: {}",
            skipped.len(),
            requested.len(),
            skipped
                .iter()
                .map(|s| s.instrument.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(BatchFetch {
        observations,
        fetched,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticSource {
        series: HashMap<String, Vec<Observation>>,
    }

    #[async_trait]
    impl DataSource for StaticSource {
        async fn fetch(
            &self,
            instrument: &str,
            range: &FetchRange,
        ) -> Result<Vec<Observation>, AnalysisError> {
            self.series
                .get(instrument)
                .cloned()
                .map(|rows| range.filter(rows))
                .ok_or_else(|| AnalysisError::upstream(instrument, "404 Not Found"))
        }
    }

    fn obs(instrument: &str, y: i32, m: u32, d: u32) -> Observation {
        Observation {
            instrument: instrument.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: Some(1),
        }
    }

    fn source() -> StaticSource {
        let mut series = HashMap::new();
        series.insert(
            "XLK".to_string(),
            vec![obs("XLK", 2024, 1, 2), obs("XLK", 2024, 1, 3)],
        );
        series.insert("EMPTY".to_string(), Vec::new());
        StaticSource { series }
    }

    #[test]
    fn test_period_parsing() {
        for period in Period::all() {
            assert_eq!(Period::from_str(period.as_str()), Some(period));
        }
        assert_eq!(Period::from_str(" 1Y "), Some(Period::OneYear));
        assert!(matches!(
            FetchRange::period("3w"),
            Err(AnalysisError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_dates_range_order() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(FetchRange::dates(a, b).is_ok());
        assert!(FetchRange::dates(b, a).is_err());
        assert_eq!(FetchRange::dates(a, b).unwrap().key(), "2024-01-01_2024-02-01");
    }

    #[test]
    fn test_period_filter_anchors_on_latest_date() {
        let rows = vec![
            obs("XLK", 2023, 12, 1),
            obs("XLK", 2024, 1, 1),
            obs("XLK", 2024, 1, 5),
            obs("XLK", 2024, 1, 8),
        ];

        let kept = FetchRange::Period(Period::FiveDays).filter(rows.clone());
        assert_eq!(kept.len(), 2);

        let kept = FetchRange::Period(Period::YearToDate).filter(rows.clone());
        assert_eq!(kept.len(), 3);

        let kept = FetchRange::Period(Period::Max).filter(rows);
        assert_eq!(kept.len(), 4);
    }

    #[tokio::test]
    async fn test_batch_skips_failures() {
        let src = source();
        let range = FetchRange::Period(Period::OneYear);
        let instruments = vec!["xlk".to_string(), "NOPE".to_string(), "EMPTY".to_string(), "XLK".to_string()];

        let batch = fetch_batch(&src, &instruments, &range).await.unwrap();

        assert_eq!(batch.fetched, vec!["XLK".to_string()]);
        assert_eq!(batch.observations.len(), 2);
        assert_eq!(batch.skipped.len(), 2);
        assert_eq!(batch.skipped[0].instrument, "NOPE");
        assert_eq!(batch.skipped[0].reason, "404 Not Found");
        assert_eq!(batch.skipped[1].reason, "no rows returned");
    }

    #[tokio::test]
    async fn test_batch_all_failed() {
        let src = source();
        let range = FetchRange::Period(Period::OneYear);
        let instruments = vec!["NOPE".to_string(), "EMPTY".to_string()];

        let err = fetch_batch(&src, &instruments, &range).await.unwrap_err();

        assert!(matches!(err, AnalysisError::EmptyBatch { ref requested } if requested.len() == 2));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_batch_empty_request() {
        let src = source();
        let err = fetch_batch(&src, &[" ".to_string()], &FetchRange::Period(Period::OneYear))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
