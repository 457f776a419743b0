//! Delimited dump of observation rows for a search query
//!
//! Flat tabular boundary consumed by external tooling: one row per stored
//! observation, grouped by product then site, ascending by time.

use crate::ingest_core::errors::StorageError;
use crate::ingest_core::ledger::LedgerStore;
use crate::ingest_core::IdentityStore;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

const HEADER: &str = "product,site,price,currency,url,observed_at";

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Storage(StorageError),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<StorageError> for ExportError {
    fn from(err: StorageError) -> Self {
        ExportError::Storage(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "io error: {}", e),
            ExportError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

/// Dump every stored observation for the query's products. Returns the
/// number of data rows written.
pub async fn export_query(
    catalog: &Arc<dyn IdentityStore>,
    ledger: &Arc<dyn LedgerStore>,
    query: &str,
    out_path: impl AsRef<Path>,
) -> Result<usize, ExportError> {
    if let Some(parent) = out_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(&out_path)?);
    writeln!(writer, "{}", HEADER)?;

    let mut rows = 0;
    for identity in catalog.candidates_for_query(query).await? {
        for site in ledger.sites_for_product(identity.id).await? {
            let observations = ledger
                .read_range(identity.id, &site, i64::MIN, i64::MAX)
                .await?;
            for obs in observations {
                writeln!(
                    writer,
                    "{},{},{:.2},{},{},{}",
                    escape_field(&identity.canonical_name),
                    escape_field(&obs.site),
                    obs.price,
                    obs.currency,
                    escape_field(&obs.url),
                    format_timestamp(obs.observed_at),
                )?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    log::info!(
        "📝 Exported {} row(s) for {:?} to {}",
        rows,
        query,
        out_path.as_ref().display()
    );

    Ok(rows)
}

/// Quote a field when it contains the delimiter, quotes or newlines.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_timestamp(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.to_rfc3339(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest_core::catalog::SqliteCatalog;
    use crate::ingest_core::ledger::SqliteLedger;
    use crate::ingest_core::types::{PriceObservation, SECS_PER_DAY};
    use tempfile::tempdir;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[tokio::test]
    async fn test_export_rows_and_header() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let catalog: Arc<dyn IdentityStore> = Arc::new(SqliteCatalog::open(&db_path).unwrap());
        let ledger: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::open(&db_path).unwrap());

        let identity = catalog
            .insert_if_absent("usb cable", "usb c cable 2m", 1000)
            .await
            .unwrap();
        for (day, site) in [(1, "A"), (2, "A"), (1, "B")] {
            ledger
                .append(&PriceObservation {
                    product_id: identity.id,
                    site: site.to_string(),
                    price: 9.99,
                    currency: "USD".to_string(),
                    url: format!("https://{}.example/p/1", site.to_lowercase()),
                    title: "USB-C Cable 2m".to_string(),
                    observed_at: day * SECS_PER_DAY,
                })
                .await
                .unwrap();
        }

        let out_path = dir.path().join("exports").join("usb_cable.csv");
        let rows = export_query(&catalog, &ledger, "usb cable", &out_path)
            .await
            .unwrap();
        assert_eq!(rows, 3);

        let content = std::fs::read_to_string(&out_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("usb c cable 2m,A,9.99,USD,"));
    }

    #[tokio::test]
    async fn test_export_unknown_query_writes_header_only() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let catalog: Arc<dyn IdentityStore> = Arc::new(SqliteCatalog::open(&db_path).unwrap());
        let ledger: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::open(&db_path).unwrap());

        let out_path = dir.path().join("empty.csv");
        let rows = export_query(&catalog, &ledger, "nothing here", &out_path)
            .await
            .unwrap();
        assert_eq!(rows, 0);

        let content = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(content.trim(), HEADER);
    }
}
