//! Detector Core - Volume Anomaly Statistics
//!
//! Turns raw daily observations into classified volume signals.
//!
//! # Architecture
//!
//! ```text
//! SeriesStore (raw OHLCV)
//!     ↓
//! FeatureEngine (volume MA, spike ratio, % changes)
//!     ↓
//! HorizonAnalyzer (short/medium/long z-scores, percentile)
//!     ↓
//! SignalDetector (signal label + intensity tier)
//!     ↓
//! EventExtractor / TickerAnalyzer / SectorAggregator
//! ```
//!
//! Everything here is a pure, synchronous computation over its input.

pub mod correlator;
pub mod detector;
pub mod events;
pub mod features;
pub mod horizon;
pub mod scorer;
pub mod sector;
pub mod ticker;
pub mod window;

pub use correlator::CorrelationEngine;
pub use detector::{IntensityTier, SignalDetector, SignalLabel};
pub use events::{
    top_spikes, EventExtractor, EventLevel, EventSummary, EventThresholds, PriceDirection,
    VolumeEvent,
};
pub use features::{FeatureEngine, FeatureRecord};
pub use horizon::{HorizonAnalyzer, HorizonReading, HorizonStatistics};
pub use scorer::{HorizonWeights, SpikeScorer};
pub use sector::{SectorAggregator, SectorEntry, SectorSummary};
pub use ticker::{LatestSnapshot, TickerAnalysis, TickerAnalyzer, TickerDetail};
pub use window::{Horizon, HorizonLengths, WindowStats, MIN_WINDOW_POINTS};
