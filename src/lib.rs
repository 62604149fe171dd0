//! volquant - sliding-window volume anomaly detection over daily OHLCV data
//!
//! - `series` - raw observations keyed by (instrument, date)
//! - `detector_core` - rolling features, multi-horizon statistics, signal
//!   classification, events and aggregation
//! - `pipeline` - data sources, cache, configuration and the analysis context
//! - `output` - tagged responses and the NaN → null boundary
//! - `error` - error taxonomy with HTTP-equivalent status codes

pub mod detector_core;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod series;

pub use error::AnalysisError;
pub use output::AnalysisResponse;
pub use pipeline::{AnalysisConfig, AnalysisContext, DataSource};
