//! volquant CLI - runs one analysis and prints the JSON response
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin volquant -- full --tickers XLK,XLF --period 6mo
//! cargo run --release --bin volquant -- quick
//! cargo run --release --bin volquant -- sectors --group sectors
//! cargo run --release --bin volquant -- ticker XLK --explain
//! ```
//!
//! ## Environment Variables
//!
//! - VOLQUANT_SOURCE - `yahoo` or `jsonl` (default: yahoo)
//! - VOLQUANT_JSONL_PATH - Observation file for the jsonl source (default: data/observations.jsonl)
//! - VOLQUANT_FETCH_TIMEOUT_SECS - HTTP timeout for the yahoo source (default: 10)
//! - VOLQUANT_* analysis settings, see `AnalysisConfig::from_env`
//! - RUST_LOG - Logging level (optional, default: info)
//!
//! Logs go to stderr; stdout carries only the JSON response. The process
//! exits with status 1 when the response is an error.

use std::env;
use std::sync::Arc;
use volquant::output::{explain, prompt_payload};
use volquant::pipeline::{AnalysisConfig, AnalysisContext, DataSource, JsonlSource, YahooChartSource};
use volquant::AnalysisResponse;

const USAGE: &str = "usage: volquant <full|quick|sectors|ticker SYMBOL> [--tickers A,B] [--period P] [--group G] [--explain]";

#[derive(Debug)]
enum Command {
    Full,
    Quick,
    Sectors,
    Ticker(String),
}

#[derive(Debug)]
struct CliArgs {
    command: Command,
    tickers: Option<Vec<String>>,
    period: Option<String>,
    group: String,
    explain: bool,
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

fn parse_args() -> Result<CliArgs, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let command = match args.first().map(|s| s.as_str()) {
        Some("full") => Command::Full,
        Some("quick") => Command::Quick,
        Some("sectors") => Command::Sectors,
        Some("ticker") => match args.get(1) {
            Some(symbol) if !symbol.starts_with("--") => Command::Ticker(symbol.clone()),
            _ => return Err("ticker needs a symbol".to_string()),
        },
        Some(other) => return Err(format!("unknown command '{}'", other)),
        None => return Err("missing command".to_string()),
    };

    let tickers = flag_value(&args, "--tickers").map(|list| {
        list.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    });

    Ok(CliArgs {
        command,
        tickers,
        period: flag_value(&args, "--period"),
        group: flag_value(&args, "--group").unwrap_or_else(|| "sectors".to_string()),
        explain: args.iter().any(|a| a == "--explain"),
    })
}

fn build_source() -> Result<Arc<dyn DataSource>, Box<dyn std::error::Error>> {
    let kind = env::var("VOLQUANT_SOURCE").unwrap_or_else(|_| "yahoo".to_string());

    match kind.to_lowercase().as_str() {
        "jsonl" => {
            let path = env::var("VOLQUANT_JSONL_PATH")
                .unwrap_or_else(|_| "data/observations.jsonl".to_string());
            log::info!("📖 Source: JSONL file {}", path);
            Ok(Arc::new(JsonlSource::new(path)))
        }
        "yahoo" => {
            let timeout = env::var("VOLQUANT_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10);
            log::info!("🌐 Source: Yahoo chart API (timeout {}s)", timeout);
            Ok(Arc::new(YahooChartSource::new(timeout)?))
        }
        other => Err(format!("unknown VOLQUANT_SOURCE '{}'", other).into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env first so a RUST_LOG set there reaches the logger
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let config = AnalysisConfig::from_env();
    log::info!("🚀 Starting volquant {:?}", args.command);
    log::info!("   MA period: {}", config.ma_period);
    log::info!(
        "   Horizons: {}/{}/{}",
        config.horizons.short,
        config.horizons.medium,
        config.horizons.long
    );
    log::info!("   Default period: {}", config.default_period);

    let source = build_source()?;
    let context = AnalysisContext::new(config, source);
    let period = args.period.as_deref();

    let response = match args.command {
        Command::Full => context.run_full_analysis(args.tickers, period).await,
        Command::Quick => context.quick_scan(args.tickers).await,
        Command::Sectors => context.sector_summary(&args.group, period).await,
        Command::Ticker(symbol) => context.ticker_detail(&symbol, period).await,
    };

    if args.explain {
        let out = serde_json::json!({
            "explanation": explain(&response),
            "payload": prompt_payload(&response),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", response.to_json_pretty()?);
    }

    if let AnalysisResponse::Error(e) = &response {
        log::error!("❌ {} (status {})", e.message, e.status);
        std::process::exit(1);
    }

    log::info!("✅ Done: {}", response.mode());
    Ok(())
}
