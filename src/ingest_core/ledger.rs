//! History ledger: append-only, deduplicating price history store
//!
//! Observations are keyed by `(product_id, site, day)`. Appending to an
//! occupied key replaces the previous entry (the newest fetch for a given
//! day wins), so re-ingestion is idempotent and a series never holds two
//! entries for the same site and day. All writes to persisted history go
//! through this component.

use super::errors::StorageError;
use super::types::{AppendOutcome, PriceObservation, ProductId};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Backend trait for price history reads and writes.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert or overwrite the entry for the observation's day bucket.
    async fn append(&self, observation: &PriceObservation) -> Result<AppendOutcome, StorageError>;

    /// Observations for one `(product, site)` series within `[from, to]`
    /// inclusive, ascending by `observed_at`. Empty when nothing matches.
    async fn read_range(
        &self,
        product_id: ProductId,
        site: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<PriceObservation>, StorageError>;

    /// Distinct sites holding history for a product.
    async fn sites_for_product(&self, product_id: ProductId) -> Result<Vec<String>, StorageError>;
}

/// SQLite-backed ledger.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS price_history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id  INTEGER NOT NULL,
                site        TEXT NOT NULL,
                day         INTEGER NOT NULL,
                price       REAL NOT NULL,
                currency    TEXT NOT NULL,
                url         TEXT NOT NULL,
                title       TEXT NOT NULL,
                observed_at INTEGER NOT NULL,
                UNIQUE(product_id, site, day)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_series
             ON price_history(product_id, site, observed_at)",
            [],
        )?;

        log::info!("✅ History ledger initialized");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn append(&self, observation: &PriceObservation) -> Result<AppendOutcome, StorageError> {
        let conn = self.conn.lock().unwrap();
        let day = observation.day();

        let occupied: bool = conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM price_history
                 WHERE product_id = ?1 AND site = ?2 AND day = ?3
             )",
            params![observation.product_id.0, observation.site, day],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO price_history
                 (product_id, site, day, price, currency, url, title, observed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(product_id, site, day) DO UPDATE SET
                 price = excluded.price,
                 currency = excluded.currency,
                 url = excluded.url,
                 title = excluded.title,
                 observed_at = excluded.observed_at",
            params![
                observation.product_id.0,
                observation.site,
                day,
                observation.price,
                observation.currency,
                observation.url,
                observation.title,
                observation.observed_at,
            ],
        )?;

        Ok(if occupied {
            AppendOutcome::Overwritten
        } else {
            AppendOutcome::Inserted
        })
    }

    async fn read_range(
        &self,
        product_id: ProductId,
        site: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<PriceObservation>, StorageError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT price, currency, url, title, observed_at
             FROM price_history
             WHERE product_id = ?1 AND site = ?2
               AND observed_at >= ?3 AND observed_at <= ?4
             ORDER BY observed_at ASC",
        )?;

        let observations = stmt
            .query_map(params![product_id.0, site, from, to], |row| {
                Ok(PriceObservation {
                    product_id,
                    site: site.to_string(),
                    price: row.get(0)?,
                    currency: row.get(1)?,
                    url: row.get(2)?,
                    title: row.get(3)?,
                    observed_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(observations)
    }

    async fn sites_for_product(&self, product_id: ProductId) -> Result<Vec<String>, StorageError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT DISTINCT site FROM price_history WHERE product_id = ?1 ORDER BY site",
        )?;
        let sites = stmt
            .query_map([product_id.0], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest_core::types::SECS_PER_DAY;
    use tempfile::tempdir;

    fn make_observation(site: &str, price: f64, observed_at: i64) -> PriceObservation {
        PriceObservation {
            product_id: ProductId(1),
            site: site.to_string(),
            price,
            currency: "USD".to_string(),
            url: "https://a.example/p/1".to_string(),
            title: "USB-C Cable 2m".to_string(),
            observed_at,
        }
    }

    #[tokio::test]
    async fn test_append_is_idempotent() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("test.db")).unwrap();
        let obs = make_observation("A", 9.99, SECS_PER_DAY + 100);

        assert_eq!(ledger.append(&obs).await.unwrap(), AppendOutcome::Inserted);
        assert_eq!(
            ledger.append(&obs).await.unwrap(),
            AppendOutcome::Overwritten
        );

        let series = ledger
            .read_range(ProductId(1), "A", i64::MIN, i64::MAX)
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].price, 9.99);
    }

    #[tokio::test]
    async fn test_same_day_overwrite_keeps_latest() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("test.db")).unwrap();

        let morning = make_observation("A", 9.99, SECS_PER_DAY + 100);
        let evening = make_observation("A", 7.99, SECS_PER_DAY + 80_000);

        ledger.append(&morning).await.unwrap();
        let outcome = ledger.append(&evening).await.unwrap();
        assert_eq!(outcome, AppendOutcome::Overwritten);

        let series = ledger
            .read_range(ProductId(1), "A", i64::MIN, i64::MAX)
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].price, 7.99);
        assert_eq!(series[0].observed_at, SECS_PER_DAY + 80_000);
    }

    #[tokio::test]
    async fn test_distinct_days_accumulate() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("test.db")).unwrap();

        for day in 0..5 {
            let obs = make_observation("A", 10.0 + day as f64, day * SECS_PER_DAY + 100);
            assert_eq!(ledger.append(&obs).await.unwrap(), AppendOutcome::Inserted);
        }

        let series = ledger
            .read_range(ProductId(1), "A", i64::MIN, i64::MAX)
            .await
            .unwrap();
        assert_eq!(series.len(), 5);
    }

    #[tokio::test]
    async fn test_read_sorted_ascending() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("test.db")).unwrap();

        // Append out of order; reads must come back time-sorted
        for day in [3, 1, 4, 0, 2] {
            let obs = make_observation("A", 10.0, day * SECS_PER_DAY + 100);
            ledger.append(&obs).await.unwrap();
        }

        let series = ledger
            .read_range(ProductId(1), "A", i64::MIN, i64::MAX)
            .await
            .unwrap();
        let times: Vec<i64> = series.iter().map(|o| o.observed_at).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(times.len(), 5);
    }

    #[tokio::test]
    async fn test_read_range_inclusive_bounds() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("test.db")).unwrap();

        for day in 0..5 {
            ledger
                .append(&make_observation("A", 10.0, day * SECS_PER_DAY))
                .await
                .unwrap();
        }

        let series = ledger
            .read_range(ProductId(1), "A", SECS_PER_DAY, 3 * SECS_PER_DAY)
            .await
            .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].observed_at, SECS_PER_DAY);
        assert_eq!(series[2].observed_at, 3 * SECS_PER_DAY);
    }

    #[tokio::test]
    async fn test_read_empty_series() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("test.db")).unwrap();

        let series = ledger
            .read_range(ProductId(42), "A", i64::MIN, i64::MAX)
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_sites_are_independent_series() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("test.db")).unwrap();

        ledger
            .append(&make_observation("A", 9.99, SECS_PER_DAY))
            .await
            .unwrap();
        ledger
            .append(&make_observation("B", 8.49, SECS_PER_DAY))
            .await
            .unwrap();

        let a = ledger
            .read_range(ProductId(1), "A", i64::MIN, i64::MAX)
            .await
            .unwrap();
        let b = ledger
            .read_range(ProductId(1), "B", i64::MIN, i64::MAX)
            .await
            .unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].price, 9.99);
        assert_eq!(b[0].price, 8.49);

        assert_eq!(
            ledger.sites_for_product(ProductId(1)).await.unwrap(),
            vec!["A".to_string(), "B".to_string()]
        );
    }
}
