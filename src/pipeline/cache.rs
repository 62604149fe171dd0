//! Read-through TTL cache for fetched series
//!
//! Advisory only: a miss costs one upstream request. Entries are keyed by
//! (instrument, fetch range) and expire `ttl_secs` after they were stored.
//! The lock is released before any await point.

use super::source::{DataSource, FetchRange};
use crate::error::AnalysisError;
use crate::series::Observation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    instrument: String,
    range: String,
}

impl CacheKey {
    fn new(instrument: &str, range: &FetchRange) -> Self {
        Self {
            instrument: instrument.to_uppercase(),
            range: range.key(),
        }
    }
}

struct CacheEntry {
    observations: Vec<Observation>,
    stored_at: i64,
}

pub struct SeriesCache {
    ttl_secs: i64,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SeriesCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached series if it was stored less than `ttl_secs` before `now`.
    /// Expired entries are evicted on lookup.
    pub fn get(&self, instrument: &str, range: &FetchRange, now: i64) -> Option<Vec<Observation>> {
        let key = CacheKey::new(instrument, range);
        let mut entries = self.lock();

        let fresh = entries
            .get(&key)
            .map(|entry| now - entry.stored_at < self.ttl_secs)?;

        if fresh {
            entries.get(&key).map(|entry| entry.observations.clone())
        } else {
            entries.remove(&key);
            None
        }
    }

    pub fn insert(&self, instrument: &str, range: &FetchRange, observations: Vec<Observation>, now: i64) {
        let key = CacheKey::new(instrument, range);
        let mut entries = self.lock();
        entries.retain(|_, entry| now - entry.stored_at < self.ttl_secs);
        entries.insert(
            key,
            CacheEntry {
                observations,
                stored_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// `DataSource` that answers from a `SeriesCache` and falls through to an
/// inner source on a miss. Failed fetches are not cached.
pub struct CachedSource<'a> {
    inner: &'a dyn DataSource,
    cache: &'a SeriesCache,
    now: i64,
}

impl<'a> CachedSource<'a> {
    pub fn new(inner: &'a dyn DataSource, cache: &'a SeriesCache, now: i64) -> Self {
        Self { inner, cache, now }
    }
}

#[async_trait]
impl<'a> DataSource for CachedSource<'a> {
    async fn fetch(
        &self,
        instrument: &str,
        range: &FetchRange,
    ) -> Result<Vec<Observation>, AnalysisError> {
        if let Some(rows) = self.cache.get(instrument, range, self.now) {
            log::debug!("Cache hit for {} ({})", instrument, range.key());
            return Ok(rows);
        }

        let rows = self.inner.fetch(instrument, range).await?;
        if !rows.is_empty() {
            self.cache.insert(instrument, range, rows.clone(), self.now);
        }
        Ok(rows)
    }
}
