//! Read-only query API for dashboards and reporting
//!
//! Thin facade over the catalog and ledger. Never triggers ingestion and
//! never mutates history; reads may run fully concurrently with an active
//! scrape run.

use crate::ingest_core::errors::{StorageError, TrendError};
use crate::ingest_core::ledger::LedgerStore;
use crate::ingest_core::trend::TrendAnalyzer;
use crate::ingest_core::types::{PriceObservation, ProductId, ProductIdentity, TrendResult};
use crate::ingest_core::IdentityStore;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Dashboard {
    catalog: Arc<dyn IdentityStore>,
    ledger: Arc<dyn LedgerStore>,
    analyzer: TrendAnalyzer,
}

impl Dashboard {
    pub fn new(
        catalog: Arc<dyn IdentityStore>,
        ledger: Arc<dyn LedgerStore>,
        flat_threshold_pct: f64,
    ) -> Self {
        let analyzer = TrendAnalyzer::new(ledger.clone(), flat_threshold_pct);
        Self {
            catalog,
            ledger,
            analyzer,
        }
    }

    /// Products known for a search query, most recently updated first.
    pub async fn find_products(&self, query: &str) -> Result<Vec<ProductIdentity>, StorageError> {
        self.catalog.candidates_for_query(query).await
    }

    /// Full price history for a product, one ordered series per site.
    pub async fn get_series(
        &self,
        product_id: ProductId,
    ) -> Result<HashMap<String, Vec<PriceObservation>>, StorageError> {
        let mut series = HashMap::new();
        for site in self.ledger.sites_for_product(product_id).await? {
            let observations = self
                .ledger
                .read_range(product_id, &site, i64::MIN, i64::MAX)
                .await?;
            series.insert(site, observations);
        }
        Ok(series)
    }

    /// Trend over the trailing window for one `(product, site)` series.
    pub async fn get_trend(
        &self,
        product_id: ProductId,
        site: &str,
        window_days: u32,
    ) -> Result<TrendResult, TrendError> {
        let now = chrono::Utc::now().timestamp();
        self.analyzer
            .analyze(product_id, site, window_days, now)
            .await
    }

    /// Most recent observation per site: the cross-site comparison view.
    pub async fn latest_prices(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<PriceObservation>, StorageError> {
        let mut latest = Vec::new();
        for site in self.ledger.sites_for_product(product_id).await? {
            let observations = self
                .ledger
                .read_range(product_id, &site, i64::MIN, i64::MAX)
                .await?;
            if let Some(observation) = observations.into_iter().last() {
                latest.push(observation);
            }
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest_core::catalog::SqliteCatalog;
    use crate::ingest_core::ledger::SqliteLedger;
    use crate::ingest_core::types::{PriceObservation, SECS_PER_DAY};
    use tempfile::tempdir;

    fn make_observation(
        product_id: ProductId,
        site: &str,
        price: f64,
        observed_at: i64,
    ) -> PriceObservation {
        PriceObservation {
            product_id,
            site: site.to_string(),
            price,
            currency: "USD".to_string(),
            url: format!("https://{}.example/p/1", site.to_lowercase()),
            title: "USB-C Cable 2m".to_string(),
            observed_at,
        }
    }

    async fn make_dashboard(dir: &tempfile::TempDir) -> (Dashboard, Arc<SqliteLedger>) {
        let db_path = dir.path().join("test.db");
        let catalog = Arc::new(SqliteCatalog::open(&db_path).unwrap());
        let ledger = Arc::new(SqliteLedger::open(&db_path).unwrap());
        (Dashboard::new(catalog, ledger.clone(), 1.0), ledger)
    }

    #[tokio::test]
    async fn test_get_series_groups_by_site() {
        let dir = tempdir().unwrap();
        let (dashboard, ledger) = make_dashboard(&dir).await;
        let id = ProductId(1);

        for day in 0..3 {
            ledger
                .append(&make_observation(id, "A", 9.99, day * SECS_PER_DAY))
                .await
                .unwrap();
        }
        ledger
            .append(&make_observation(id, "B", 8.49, SECS_PER_DAY))
            .await
            .unwrap();

        let series = dashboard.get_series(id).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series["A"].len(), 3);
        assert_eq!(series["B"].len(), 1);
    }

    #[tokio::test]
    async fn test_get_series_empty_for_unknown_product() {
        let dir = tempdir().unwrap();
        let (dashboard, _ledger) = make_dashboard(&dir).await;

        let series = dashboard.get_series(ProductId(99)).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_latest_prices_picks_newest_per_site() {
        let dir = tempdir().unwrap();
        let (dashboard, ledger) = make_dashboard(&dir).await;
        let id = ProductId(1);

        ledger
            .append(&make_observation(id, "A", 9.99, SECS_PER_DAY))
            .await
            .unwrap();
        ledger
            .append(&make_observation(id, "A", 7.99, 2 * SECS_PER_DAY))
            .await
            .unwrap();
        ledger
            .append(&make_observation(id, "B", 8.49, SECS_PER_DAY))
            .await
            .unwrap();

        let latest = dashboard.latest_prices(id).await.unwrap();
        assert_eq!(latest.len(), 2);
        let by_site: HashMap<_, _> = latest.iter().map(|o| (o.site.clone(), o.price)).collect();
        assert_eq!(by_site["A"], 7.99);
        assert_eq!(by_site["B"], 8.49);
    }
}
