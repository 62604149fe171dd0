//! Error taxonomy for analysis runs
//!
//! Per-instrument failures are recovered inside the batch fetch. Everything
//! else surfaces as a single structured error response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// One instrument could not be fetched. Recovered by skipping it.
    #[error("fetch failed for {instrument}: {reason}")]
    UpstreamFetch { instrument: String, reason: String },

    /// Every requested instrument failed to fetch.
    #[error("no data could be fetched for any of the {} requested instruments ({})", requested.len(), requested.join(", "))]
    EmptyBatch { requested: Vec<String> },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no data for instrument {0}")]
    UnknownInstrument(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// HTTP-equivalent status for the error response
    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::InvalidRequest(_) => 400,
            AnalysisError::UnknownInstrument(_) => 404,
            AnalysisError::EmptyBatch { .. } | AnalysisError::UpstreamFetch { .. } => 502,
            AnalysisError::Http(_) | AnalysisError::Decode(_) | AnalysisError::Io(_) => 500,
        }
    }

    pub fn upstream(instrument: &str, reason: impl ToString) -> Self {
        AnalysisError::UpstreamFetch {
            instrument: instrument.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_message_names_instruments() {
        let err = AnalysisError::EmptyBatch {
            requested: vec!["XLK".to_string(), "XLF".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("XLK, XLF"));
        assert!(msg.contains("2 requested"));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AnalysisError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(AnalysisError::UnknownInstrument("XLK".into()).status_code(), 404);
        assert_eq!(AnalysisError::upstream("XLK", "timeout").status_code(), 502);
    }
}
