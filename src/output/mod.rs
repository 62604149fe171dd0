//! Output boundary
//!
//! - `response` - tagged response types built from detector values
//! - `shape` - NaN/infinity → null and rounding, applied to every float
//! - `explain` - rule-based text summary and reduced prompt payload

pub mod explain;
pub mod response;
pub mod shape;

pub use explain::{explain, prompt_payload};
pub use response::{
    AnalysisResponse, ErrorResult, FullAnalysisResult, QuickScanResult, SectorSummaryResult,
    TickerDetailResult, VERSION,
};
