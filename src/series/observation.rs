//! Daily OHLCV observation for one instrument

use crate::error::AnalysisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub instrument: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Missing when the upstream did not report a volume for the session
    pub volume: Option<u64>,
}

impl Observation {
    /// Parse an Observation from a JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, AnalysisError> {
        let mut obs: Observation = serde_json::from_str(line)?;
        obs.instrument = obs.instrument.trim().to_uppercase();
        Ok(obs)
    }

    pub fn volume_f64(&self) -> Option<f64> {
        self.volume.map(|v| v as f64)
    }

    /// Close versus open of the same session, in percent
    pub fn intraday_change_pct(&self) -> Option<f64> {
        if self.open == 0.0 || !self.open.is_finite() || !self.close.is_finite() {
            return None;
        }
        Some((self.close - self.open) / self.open * 100.0)
    }
}
