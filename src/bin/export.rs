//! Export Binary - delimited dump of price history for a query
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin export -- --query "usb cable" --out exports/usb_cable.csv
//! ```
//!
//! ## Environment Variables
//!
//! - PRICEWATCH_DB_PATH - SQLite database path (default: data/pricewatch.db)
//! - RUST_LOG - Logging level (optional, default: info)

use pricewatch::export::export_query;
use pricewatch::ingest_core::{IdentityStore, LedgerStore, SqliteCatalog, SqliteLedger};
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
    let out_path = arg_value("--out").unwrap_or_else(|| {
        format!("exports/{}.csv", query.to_lowercase().replace(' ', "_"))
    });
    let db_path = env::var("PRICEWATCH_DB_PATH").unwrap_or_else(|_| "data/pricewatch.db".to_string());

    let catalog: Arc<dyn IdentityStore> = Arc::new(SqliteCatalog::open(&db_path)?);
    let ledger: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::open(&db_path)?);

    let rows = export_query(&catalog, &ledger, &query, &out_path).await?;
    log::info!("✅ Wrote {} row(s) to {}", rows, out_path);

    Ok(())
}
