//! Series Store - the raw OHLCV substrate for one analysis run

pub mod observation;
pub mod store;

pub use observation::Observation;
pub use store::SeriesStore;
