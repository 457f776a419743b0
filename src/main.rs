//! Ingestion runner
//!
//! Runs one scrape cycle: spawns one adaptor task per `<site>.jsonl` file in
//! the fixtures directory, funnels every raw record through the pipeline and
//! logs the run summary.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --query "usb cable"
//! ```
//!
//! ## Environment Variables
//!
//! - PRICEWATCH_DB_PATH - SQLite database path (default: data/pricewatch.db)
//! - PRICEWATCH_FIXTURES_DIR - Directory of per-site JSONL fixtures (default: fixtures)
//! - DEFAULT_CURRENCY, SIMILARITY_THRESHOLD, TREND_FLAT_THRESHOLD_PCT,
//!   DEDUP_GRANULARITY - core tunables
//! - RUST_LOG - Logging level (optional, default: info)

use pricewatch::adaptors::{JsonlAdaptor, SiteAdaptor};
use pricewatch::config::CoreConfig;
use pricewatch::ingest_core::{run_ingestion, IngestPipeline, SqliteCatalog, SqliteLedger};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 1024;

struct RunnerConfig {
    query: String,
    db_path: PathBuf,
    fixtures_dir: PathBuf,
}

impl RunnerConfig {
    fn from_env_and_args() -> Result<Self, Box<dyn std::error::Error>> {
        let query = arg_value("--query").ok_or("missing required argument: --query <text>")?;

        Ok(Self {
            query,
            db_path: env::var("PRICEWATCH_DB_PATH")
                .unwrap_or_else(|_| "data/pricewatch.db".to_string())
                .into(),
            fixtures_dir: env::var("PRICEWATCH_FIXTURES_DIR")
                .unwrap_or_else(|_| "fixtures".to_string())
                .into(),
        })
    }
}

fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

/// One adaptor per `<site>.jsonl` fixture, site named after the file stem.
fn discover_adaptors(fixtures_dir: &PathBuf) -> Result<Vec<JsonlAdaptor>, std::io::Error> {
    let mut adaptors = Vec::new();
    for entry in std::fs::read_dir(fixtures_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            adaptors.push(JsonlAdaptor::new(stem.to_string(), &path));
        }
    }
    Ok(adaptors)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let runner = RunnerConfig::from_env_and_args()?;
    let core = CoreConfig::from_env()?;

    log::info!("🚀 Starting price ingestion run");
    log::info!("   Query: {:?}", runner.query);
    log::info!("   Database: {}", runner.db_path.display());
    log::info!("   Fixtures: {}", runner.fixtures_dir.display());
    log::info!("   Default currency: {}", core.default_currency);
    log::info!("   Similarity threshold: {}", core.similarity_threshold);

    let catalog = Arc::new(SqliteCatalog::open(&runner.db_path)?);
    let ledger = Arc::new(SqliteLedger::open(&runner.db_path)?);
    let pipeline = Arc::new(IngestPipeline::new(&core, catalog, ledger));

    let adaptors = discover_adaptors(&runner.fixtures_dir)?;
    if adaptors.is_empty() {
        log::warn!(
            "⚠️  No <site>.jsonl fixtures found in {}",
            runner.fixtures_dir.display()
        );
        return Ok(());
    }
    log::info!("📖 {} site adaptor(s) discovered", adaptors.len());

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let ingestion = tokio::spawn(run_ingestion(rx, pipeline));

    // One concurrent fetch task per site; each feeds the shared channel
    let mut fetchers = Vec::new();
    for adaptor in adaptors {
        let tx = tx.clone();
        let query = runner.query.clone();
        fetchers.push(tokio::spawn(async move {
            match adaptor.fetch(&query).await {
                Ok(records) => {
                    for record in records {
                        if tx.send(record).await.is_err() {
                            log::error!("❌ Ingestion channel closed early");
                            break;
                        }
                    }
                }
                Err(e) => {
                    log::error!("❌ Adaptor {} failed: {}", adaptor.site(), e);
                }
            }
        }));
    }
    drop(tx);

    for fetcher in fetchers {
        let _ = fetcher.await;
    }

    let summary = ingestion.await?;
    log::info!(
        "📊 Run finished: {} inserted, {} overwritten, {} skipped, {} failed",
        summary.inserted,
        summary.overwritten,
        summary.skipped,
        summary.failed
    );

    Ok(())
}
