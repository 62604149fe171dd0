//! Yahoo Finance chart API adapter
//!
//! Fetches daily OHLCV bars for one symbol.
//!
//! ## API Reference
//!
//! Endpoint: https://query1.finance.yahoo.com/v8/finance/chart/{symbol}
//! Query: `interval=1d` plus either `range={period}` or `period1`/`period2`
//! (Unix seconds)
//! Returns: `chart.result[0]` with parallel `timestamp` and
//! `indicators.quote[0].{open,high,low,close,volume}` arrays
//!
//! ## Usage
//!
//! ```rust,ignore
//! use volquant::pipeline::{DataSource, FetchRange, YahooChartSource};
//!
//! let source = YahooChartSource::new(10)?;
//! let rows = source.fetch("XLK", &FetchRange::period("1y")?).await?;
//! ```

use super::source::{DataSource, FetchRange};
use crate::error::AnalysisError;
use crate::series::Observation;
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) volquant/0.2";

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartMeta {
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

pub struct YahooChartSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartSource {
    /// Client against the public endpoint with the given request timeout
    pub fn new(timeout_secs: u64) -> Result<Self, AnalysisError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn query(range: &FetchRange) -> Vec<(&'static str, String)> {
        let mut query = vec![("interval", "1d".to_string())];
        match range {
            FetchRange::Period(period) => query.push(("range", period.as_str().to_string())),
            FetchRange::Dates { start, end } => {
                let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
                // period2 is exclusive
                let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_400;
                query.push(("period1", period1.to_string()));
                query.push(("period2", period2.to_string()));
            }
        }
        query
    }
}

#[async_trait]
impl DataSource for YahooChartSource {
    async fn fetch(
        &self,
        instrument: &str,
        range: &FetchRange,
    ) -> Result<Vec<Observation>, AnalysisError> {
        let instrument = instrument.to_uppercase();
        let url = format!("{}/v8/finance/chart/{}", self.base_url, instrument);

        let response = self
            .client
            .get(&url)
            .query(&Self::query(range))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::upstream(
                &instrument,
                format!("chart API error: {}", status),
            ));
        }

        let chart: ChartResponse = response.json().await?;
        let rows = parse_chart(&instrument, chart)?;

        log::debug!("Yahoo chart {} ({}): {} rows", instrument, range.key(), rows.len());
        Ok(rows)
    }
}

/// Convert a chart payload into ascending observations
///
/// Bars with any missing price are dropped. A missing or negative volume
/// becomes `None`.
pub fn parse_chart(instrument: &str, response: ChartResponse) -> Result<Vec<Observation>, AnalysisError> {
    if let Some(err) = response.chart.error {
        return Err(AnalysisError::upstream(
            instrument,
            match err.description {
                Some(description) => format!("{}: {}", err.code, description),
                None => err.code,
            },
        ));
    }

    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| AnalysisError::upstream(instrument, "empty chart result"))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut observations = Vec::with_capacity(result.timestamp.len());
    let mut dropped = 0usize;

    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten().filter(|x| x.is_finite());

        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            dropped += 1;
            continue;
        };

        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            dropped += 1;
            continue;
        };

        let volume = field(&quote.volume)
            .filter(|v| *v >= 0.0)
            .map(|v| v.round() as u64);

        observations.push(Observation {
            instrument: instrument.to_uppercase(),
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if dropped > 0 {
        log::debug!("{}: dropped {} incomplete bars", instrument, dropped);
    }

    observations.sort_by_key(|o| o.date);
    observations.dedup_by_key(|o| o.date);
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "XLK", "gmtoffset": -14400 },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [190.1, 188.0, null],
                        "high":   [191.0, 189.5, 187.0],
                        "low":    [189.0, 187.2, 185.0],
                        "close":  [190.5, 188.9, 186.1],
                        "volume": [8123400, null, 7000000]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart() {
        let response: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let rows = parse_chart("xlk", response).unwrap();

        // third bar has no open price
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].instrument, "XLK");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[0].volume, Some(8_123_400));
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(rows[1].volume, None);
        assert_eq!(rows[1].close, 188.9);
    }

    #[test]
    fn test_parse_chart_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();

        let err = parse_chart("NOPE", response).unwrap_err();
        match err {
            AnalysisError::UpstreamFetch { instrument, reason } => {
                assert_eq!(instrument, "NOPE");
                assert!(reason.starts_with("Not Found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_query_for_dates() {
        let range = FetchRange::dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
        .unwrap();

        let query = YahooChartSource::query(&range);
        assert_eq!(query[1], ("period1", "1704067200".to_string()));
        assert_eq!(query[2], ("period2", "1704240000".to_string()));
    }

    #[tokio::test]
    #[ignore] // Run only when testing with live API
    async fn test_fetch_live() {
        let source = YahooChartSource::new(10).unwrap();
        let range = FetchRange::period("1mo").unwrap();

        let rows = source.fetch("SPY", &range).await.unwrap();
        assert!(!rows.is_empty());
        assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
    }
}
