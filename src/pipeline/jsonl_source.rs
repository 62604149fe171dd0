//! Offline data source: one observation per JSONL line

use super::source::{DataSource, FetchRange};
use crate::error::AnalysisError;
use crate::series::{Observation, SeriesStore};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads the whole file on every fetch and keeps the requested instrument
///
/// Blank lines are ignored. Malformed lines are logged and skipped.
/// Duplicate (instrument, date) rows keep the first occurrence.
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_instrument(&self, instrument: &str) -> Result<Vec<Observation>, AnalysisError> {
        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();

        let mut store = SeriesStore::new();
        let mut line_no = 0usize;
        let mut malformed = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match Observation::from_jsonl(line) {
                Ok(obs) if obs.instrument == instrument => {
                    store.insert(obs);
                }
                Ok(_) => {}
                Err(e) => {
                    malformed += 1;
                    log::debug!("{}:{}: {}", self.path.display(), line_no, e);
                }
            }
        }

        if malformed > 0 {
            log::warn!(
                "⚠️  Skipped {} malformed lines in {}",
                malformed,
                self.path.display()
            );
        }

        Ok(store.series(instrument).into_iter().cloned().collect())
    }
}

#[async_trait]
impl DataSource for JsonlSource {
    async fn fetch(
        &self,
        instrument: &str,
        range: &FetchRange,
    ) -> Result<Vec<Observation>, AnalysisError> {
        let instrument = instrument.to_uppercase();
        let rows = self.read_instrument(&instrument).await?;

        if rows.is_empty() {
            return Err(AnalysisError::upstream(
                &instrument,
                format!("not present in {}", self.path.display()),
            ));
        }

        Ok(range.filter(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::source::Period;
    use chrono::NaiveDate;
    use tokio::io::AsyncWriteExt;

    async fn write_fixture(lines: &[&str]) -> (tempfile::TempDir, PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("observations.jsonl");

        let mut file = tokio::fs::File::create(&file_path).await.unwrap();
        for line in lines {
            file.write_all(line.as_bytes()).await.unwrap();
            file.write_all(b"\n").await.unwrap();
        }
        file.flush().await.unwrap();

        (temp_dir, file_path)
    }

    #[tokio::test]
    async fn test_fetch_filters_and_orders() {
        let (_dir, path) = write_fixture(&[
            r#"{"instrument":"XLK","date":"2024-03-04","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":300}"#,
            r#"{"instrument":"xlf","date":"2024-03-01","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":50}"#,
            "",
            r#"{"instrument":"XLK","date":"2024-03-01","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":100}"#,
            r#"{"instrument":"XLK","date":"2024-03-01","open":9.0,"high":9.0,"low":9.0,"close":9.0,"volume":999}"#,
            r#"{"broken": "#,
        ])
        .await;

        let source = JsonlSource::new(&path);
        let rows = source
            .fetch("xlk", &FetchRange::Period(Period::Max))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(rows[0].volume, Some(100));
        assert_eq!(rows[1].volume, Some(300));
    }

    #[tokio::test]
    async fn test_fetch_date_range() {
        let (_dir, path) = write_fixture(&[
            r#"{"instrument":"XLE","date":"2024-03-01","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":1}"#,
            r#"{"instrument":"XLE","date":"2024-03-05","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":2}"#,
        ])
        .await;

        let range = FetchRange::dates(
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap();
        let rows = JsonlSource::new(&path).fetch("XLE", &range).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].volume, Some(2));
    }

    #[tokio::test]
    async fn test_missing_instrument_and_file() {
        let (_dir, path) = write_fixture(&[
            r#"{"instrument":"XLE","date":"2024-03-01","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":1}"#,
        ])
        .await;
        let range = FetchRange::Period(Period::OneYear);

        let err = JsonlSource::new(&path).fetch("SPY", &range).await.unwrap_err();
        assert!(matches!(err, AnalysisError::UpstreamFetch { .. }));

        let err = JsonlSource::new("/nonexistent/volquant.jsonl")
            .fetch("SPY", &range)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
