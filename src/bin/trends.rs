//! Trends Binary - read-only comparison and trend report for a query
//!
//! Prints, for every product known for the query, the latest price per site
//! and the trend over the requested window. Never ingests.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin trends -- --query "usb cable" --window 7
//! ```
//!
//! ## Environment Variables
//!
//! - PRICEWATCH_DB_PATH - SQLite database path (default: data/pricewatch.db)
//! - TREND_FLAT_THRESHOLD_PCT - flat band in percent (default: 1.0)
//! - RUST_LOG - Logging level (optional, default: info)

use pricewatch::config::CoreConfig;
use pricewatch::dashboard::Dashboard;
use pricewatch::ingest_core::{IdentityStore, LedgerStore, SqliteCatalog, SqliteLedger, TrendError};
use std::env;
use std::sync::Arc;

fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let query = arg_value("--query").ok_or("missing required argument: --query <text>")?;
    let window_days: u32 = arg_value("--window")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(7);
    let db_path = env::var("PRICEWATCH_DB_PATH").unwrap_or_else(|_| "data/pricewatch.db".to_string());
    let core = CoreConfig::from_env()?;

    let catalog: Arc<dyn IdentityStore> = Arc::new(SqliteCatalog::open(&db_path)?);
    let ledger: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::open(&db_path)?);
    let dashboard = Dashboard::new(catalog, ledger, core.trend_flat_threshold_pct);

    let products = dashboard.find_products(&query).await?;
    if products.is_empty() {
        println!("No products recorded for {:?} yet.", query);
        return Ok(());
    }

    for product in products {
        println!("{} (id {})", product.canonical_name, product.id);

        for observation in dashboard.latest_prices(product.id).await? {
            let trend_line = match dashboard
                .get_trend(product.id, &observation.site, window_days)
                .await
            {
                Ok(trend) => format!(
                    "{} {:+.1}% over {}d (avg {:.2}, {} points)",
                    trend.direction.as_str(),
                    trend.pct_change,
                    trend.window_days,
                    trend.moving_avg,
                    trend.sample_count
                ),
                Err(TrendError::InsufficientData { .. }) => "no trend yet".to_string(),
                Err(e) => return Err(e.into()),
            };

            println!(
                "  {:<12} {:>10.2} {}  {}",
                observation.site, observation.price, observation.currency, trend_line
            );
        }
        println!();
    }

    Ok(())
}
