//! Rule-based explanation of an analysis response
//!
//! Deterministic text summary of a response plus the reduced payload a
//! caller would hand to a language model instead of the full response.

use super::response::{
    AnalysisResponse, FullAnalysisResult, QuickScanResult, SectorSummaryResult,
    TickerDetailResult,
};
use serde_json::{json, Value};
use std::fmt::Write;

/// Quick-scan entries at or above this spike ratio are called out
const NOTABLE_SPIKE: f64 = 1.5;

/// Lines per list in explanations and prompt payloads
const LIST_LIMIT: usize = 5;

/// Quick-scan rows kept in the prompt payload
const PROMPT_SCAN_ROWS: usize = 10;

fn signed_pct(v: Option<f64>) -> String {
    v.map(|v| format!("{:+.2}%", v)).unwrap_or_else(|| "n/a".to_string())
}

fn ratio(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}x", v)).unwrap_or_else(|| "n/a".to_string())
}

pub fn explain(response: &AnalysisResponse) -> String {
    match response {
        AnalysisResponse::FullAnalysis(r) => explain_full(r),
        AnalysisResponse::QuickScan(r) => explain_quick_scan(r),
        AnalysisResponse::SectorSummary(r) => explain_sectors(r),
        AnalysisResponse::TickerDetail(r) => explain_ticker(r),
        AnalysisResponse::Error(e) => format!("Analysis failed ({}): {}", e.status, e.message),
    }
}

fn explain_quick_scan(r: &QuickScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quick scan ({})", r.timestamp.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Instruments monitored: {}", r.data.len());
    out.push('\n');

    let mut notable: Vec<_> = r
        .data
        .iter()
        .filter(|d| d.spike_ratio.map_or(false, |s| s >= NOTABLE_SPIKE))
        .collect();
    notable.sort_by(|a, b| {
        b.spike_ratio
            .unwrap_or(0.0)
            .total_cmp(&a.spike_ratio.unwrap_or(0.0))
    });

    match notable.first() {
        Some(top) => {
            let _ = writeln!(out, "Notable volume (spike ratio >= {:.1}x):", NOTABLE_SPIKE);
            for d in notable.iter().take(LIST_LIMIT) {
                let _ = writeln!(
                    out,
                    "  - {} ({}): volume {}, price {}",
                    d.instrument,
                    d.name,
                    ratio(d.spike_ratio),
                    signed_pct(d.price_change_pct)
                );
            }
            let _ = write!(
                out,
                "\nConclusion: volume surge on {} and others. Watch short-term momentum.",
                top.instrument
            );
        }
        None => {
            out.push_str("Conclusion: no clear volume anomaly right now. Stay on watch.");
        }
    }

    out
}

fn explain_full(r: &FullAnalysisResult) -> String {
    let mut out = String::new();
    let (start, end) = r
        .metadata
        .date_range
        .map(|d| (d.start.to_string(), d.end.to_string()))
        .unwrap_or_else(|| ("?".to_string(), "?".to_string()));

    let _ = writeln!(out, "Full analysis ({} to {})", start, end);
    let _ = writeln!(
        out,
        "Instruments analyzed: {}",
        r.metadata.instruments_analyzed.len()
    );
    if !r.metadata.skipped.is_empty() {
        let skipped: Vec<&str> = r.metadata.skipped.iter().map(|s| s.instrument.as_str()).collect();
        let _ = writeln!(out, "Skipped: {}", skipped.join(", "));
    }
    out.push('\n');

    let summary = &r.summary;
    if summary.total_events == 0 {
        out.push_str("No volume events detected.\n");
        out.push_str("\nConclusion: nothing unusual in the period. Volume stays in its normal range.");
        return out;
    }

    let _ = writeln!(out, "Volume events detected: {}", summary.total_events);
    if !summary.by_level.is_empty() {
        let levels: Vec<String> = summary
            .by_level
            .iter()
            .map(|(level, count)| format!("{}: {}", level.as_str(), count))
            .collect();
        let _ = writeln!(out, "  By level: {}", levels.join(", "));
    }

    if r.top_spikes.is_empty() {
        out.push_str("\nConclusion: no clear volume anomaly in the period. Trading looks normal.");
        return out;
    }

    out.push_str("\nLargest volume spikes:\n");
    for spike in r.top_spikes.iter().take(LIST_LIMIT) {
        let _ = writeln!(
            out,
            "  - {} ({}): {} spike, price {}",
            spike.instrument,
            spike.date,
            ratio(spike.spike_ratio),
            signed_pct(spike.price_change_pct)
        );
    }

    let mut recent: Vec<&str> = Vec::new();
    for event in summary.latest_events.iter().take(LIST_LIMIT) {
        if !recent.contains(&event.instrument.as_str()) {
            recent.push(&event.instrument);
        }
    }

    if recent.is_empty() {
        let _ = write!(
            out,
            "\nConclusion: past spikes on {} and others. Stay on watch for now.",
            r.top_spikes[0].instrument
        );
    } else {
        recent.truncate(3);
        let _ = writeln!(
            out,
            "\nConclusion: recent volume anomalies on {}.",
            recent.join(", ")
        );
        out.push_str("   Confirm the trend holds for 2-3 days before entering a position.");
    }

    out
}

fn explain_sectors(r: &SectorSummaryResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Sector summary ({}, {}): {} groups, {} hot, {} warm, {} cold",
        r.group, r.period, r.total_sectors, r.hot_sectors, r.warm_sectors, r.cold_sectors
    );

    for s in r.sectors.iter().take(LIST_LIMIT) {
        let _ = writeln!(
            out,
            "  - {} ({}): short z {}, {} / {}",
            s.instrument,
            s.sector,
            s.short_zscore
                .map(|z| format!("{:+.2}", z))
                .unwrap_or_else(|| "n/a".to_string()),
            s.signal.as_str(),
            s.status.as_str()
        );
    }

    match r.sectors.first() {
        Some(top) if r.hot_sectors > 0 => {
            let _ = write!(
                out,
                "\nConclusion: {} leads with unusual short-term volume.",
                top.sector
            );
        }
        _ => out.push_str("\nConclusion: no sector shows unusual short-term volume."),
    }

    out
}

fn explain_ticker(r: &TickerDetailResult) -> String {
    let mut out = String::new();
    let latest = &r.latest;
    let _ = writeln!(
        out,
        "{} ({}) on {}: price {}, change {}, volume {}",
        r.instrument,
        r.name,
        latest.date,
        latest
            .price
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "n/a".to_string()),
        signed_pct(latest.price_change_pct),
        ratio(latest.spike_ratio)
    );
    let _ = write!(
        out,
        "{} volume events over {} sessions.",
        r.events.len(),
        r.history.len()
    );

    if let Some(last) = r.events.iter().max_by_key(|e| e.date) {
        let _ = write!(
            out,
            " Most recent: {} on {} ({}).",
            last.level.as_str(),
            last.date,
            ratio(last.spike_ratio)
        );
    }

    out
}

/// Reduced response for a language-model prompt
pub fn prompt_payload(response: &AnalysisResponse) -> Value {
    match response {
        AnalysisResponse::QuickScan(r) => json!({
            "mode": "quick_scan",
            "timestamp": r.timestamp,
            "data": r.data.iter().take(PROMPT_SCAN_ROWS).collect::<Vec<_>>(),
        }),
        AnalysisResponse::FullAnalysis(r) => json!({
            "mode": "full_analysis",
            "metadata": {
                "date_range": r.metadata.date_range,
                "instruments_analyzed": r.metadata.instruments_analyzed.len(),
            },
            "summary": {
                "total_events": r.summary.total_events,
                "by_level": r.summary.by_level,
                "latest_events": r.summary.latest_events.iter().take(LIST_LIMIT).collect::<Vec<_>>(),
            },
            "top_spikes": r.top_spikes.iter().take(LIST_LIMIT).collect::<Vec<_>>(),
        }),
        AnalysisResponse::SectorSummary(r) => json!({
            "mode": "sector_summary",
            "group": r.group,
            "hot_sectors": r.hot_sectors,
            "warm_sectors": r.warm_sectors,
            "signals": r.signals,
            "sectors": r.sectors.iter().take(LIST_LIMIT).collect::<Vec<_>>(),
        }),
        AnalysisResponse::TickerDetail(r) => json!({
            "mode": "ticker_detail",
            "instrument": r.instrument,
            "latest": r.latest,
            "events": r.events.iter().rev().take(LIST_LIMIT).collect::<Vec<_>>(),
        }),
        AnalysisResponse::Error(e) => json!({
            "mode": "error",
            "message": e.message,
        }),
    }
}
