//! # Analysis Pipeline
//!
//! Everything between the upstream data source and the output boundary:
//!
//! 1. Instruments are fetched through a `DataSource` (Yahoo chart API or a
//!    local JSONL file), read through a TTL cache
//! 2. Failing instruments are skipped and reported; the run fails only when
//!    nothing could be fetched
//! 3. The surviving series go through the detector core
//! 4. Results leave as an `AnalysisResponse`
//!
//! ## Module Organization
//!
//! - `config` - `AnalysisConfig` loaded from `VOLQUANT_*` env vars
//! - `universe` - static instrument groups and display names
//! - `source` - `DataSource` trait, fetch ranges, batch fetch
//! - `cache` - read-through TTL cache of fetched series
//! - `yahoo` - HTTP adapter for the Yahoo chart endpoint
//! - `jsonl_source` - offline adapter over a JSONL file
//! - `engine` - `AnalysisContext` and the four analysis operations

pub mod cache;
pub mod config;
pub mod engine;
pub mod jsonl_source;
pub mod source;
pub mod universe;
pub mod yahoo;

// Re-export commonly used types
pub use cache::{CachedSource, SeriesCache};
pub use config::AnalysisConfig;
pub use engine::AnalysisContext;
pub use jsonl_source::JsonlSource;
pub use source::{fetch_batch, BatchFetch, DataSource, FetchRange, Period, SkippedInstrument};
pub use universe::UniverseGroup;
pub use yahoo::YahooChartSource;
