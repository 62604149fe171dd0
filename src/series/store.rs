//! In-memory table of observations keyed by (instrument, date)

use super::observation::Observation;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    series: BTreeMap<String, BTreeMap<NaiveDate, Observation>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self {
            series: BTreeMap::new(),
        }
    }

    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut store = Self::new();
        store.extend(observations);
        store
    }

    /// Insert an observation. Returns false when (instrument, date) already
    /// exists; the stored observation is left untouched.
    pub fn insert(&mut self, mut obs: Observation) -> bool {
        obs.instrument = obs.instrument.trim().to_uppercase();
        let by_date = self.series.entry(obs.instrument.clone()).or_default();

        if by_date.contains_key(&obs.date) {
            log::warn!(
                "Duplicate observation ignored: {} {}",
                obs.instrument,
                obs.date
            );
            return false;
        }

        by_date.insert(obs.date, obs);
        true
    }

    /// Insert many observations, returning the number of duplicates dropped
    pub fn extend(&mut self, observations: impl IntoIterator<Item = Observation>) -> usize {
        observations
            .into_iter()
            .map(|obs| self.insert(obs))
            .filter(|inserted| !inserted)
            .count()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &String> {
        self.series.keys()
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.series.contains_key(&instrument.to_uppercase())
    }

    /// Observations of one instrument, ascending by date
    pub fn series(&self, instrument: &str) -> Vec<&Observation> {
        self.series
            .get(&instrument.to_uppercase())
            .map(|by_date| by_date.values().collect())
            .unwrap_or_default()
    }

    /// All observations ordered by (instrument, date)
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.series.values().flat_map(|by_date| by_date.values())
    }

    pub fn len(&self) -> usize {
        self.series.values().map(|by_date| by_date.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self
            .series
            .values()
            .filter_map(|by_date| by_date.keys().next())
            .min()?;
        let end = self
            .series
            .values()
            .filter_map(|by_date| by_date.keys().next_back())
            .max()?;
        Some((*start, *end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(instrument: &str, day: u32, volume: u64) -> Observation {
        Observation {
            instrument: instrument.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: Some(volume),
        }
    }

    #[test]
    fn test_duplicate_rejected_first_wins() {
        let mut store = SeriesStore::new();

        assert!(store.insert(obs("XLK", 2, 100)));
        assert!(!store.insert(obs("xlk", 2, 999)));

        let series = store.series("XLK");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].volume, Some(100));
    }

    #[test]
    fn test_series_sorted_by_date() {
        let store = SeriesStore::from_observations(vec![
            obs("XLK", 5, 500),
            obs("XLK", 1, 100),
            obs("XLK", 3, 300),
        ]);

        let days: Vec<u64> = store
            .series("XLK")
            .iter()
            .filter_map(|o| o.volume)
            .collect();
        assert_eq!(days, vec![100, 300, 500]);
    }

    #[test]
    fn test_extend_counts_duplicates() {
        let mut store = SeriesStore::new();
        let dropped = store.extend(vec![obs("XLK", 1, 1), obs("XLK", 1, 2), obs("XLF", 1, 3)]);

        assert_eq!(dropped, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.instruments().count(), 2);
    }

    #[test]
    fn test_date_range_spans_instruments() {
        let store = SeriesStore::from_observations(vec![
            obs("XLK", 4, 1),
            obs("XLK", 9, 1),
            obs("XLF", 2, 1),
            obs("XLF", 6, 1),
        ]);

        let (start, end) = store.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert!(SeriesStore::new().date_range().is_none());
    }
}
