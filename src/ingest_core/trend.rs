//! Trend derivation over a product's ledger slice
//!
//! Pure read: every call recomputes from the ledger, nothing is cached or
//! stored. Series here are small (one point per site per day), so
//! correctness wins over staleness.

use super::errors::TrendError;
use super::ledger::LedgerStore;
use super::types::{ProductId, TrendDirection, TrendResult, SECS_PER_DAY};
use std::sync::Arc;

const MIN_SAMPLES: usize = 2;

pub struct TrendAnalyzer {
    ledger: Arc<dyn LedgerStore>,
    flat_threshold_pct: f64,
}

impl TrendAnalyzer {
    /// `flat_threshold_pct` is the band (in percent) inside which a change
    /// counts as flat, so day-to-day noise does not flap the direction.
    pub fn new(ledger: Arc<dyn LedgerStore>, flat_threshold_pct: f64) -> Self {
        Self {
            ledger,
            flat_threshold_pct,
        }
    }

    /// Derive direction, percentage change and moving average for one
    /// `(product, site)` series over the trailing `window_days` ending at
    /// `now`.
    ///
    /// Fails with `TrendError::InsufficientData` when fewer than two
    /// observations fall inside the window.
    pub async fn analyze(
        &self,
        product_id: ProductId,
        site: &str,
        window_days: u32,
        now: i64,
    ) -> Result<TrendResult, TrendError> {
        let from = now - window_days as i64 * SECS_PER_DAY;
        let series = self.ledger.read_range(product_id, site, from, now).await?;

        if series.len() < MIN_SAMPLES {
            return Err(TrendError::InsufficientData {
                found: series.len(),
                required: MIN_SAMPLES,
            });
        }

        let earliest = &series[0];
        let latest = &series[series.len() - 1];
        let pct_change = (latest.price - earliest.price) / earliest.price * 100.0;

        let direction = if pct_change > self.flat_threshold_pct {
            TrendDirection::Rising
        } else if pct_change < -self.flat_threshold_pct {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        };

        let moving_avg = series.iter().map(|o| o.price).sum::<f64>() / series.len() as f64;

        Ok(TrendResult {
            product_id,
            site: site.to_string(),
            direction,
            pct_change,
            moving_avg,
            window_days,
            sample_count: series.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest_core::ledger::SqliteLedger;
    use crate::ingest_core::types::PriceObservation;
    use tempfile::tempdir;

    fn make_observation(price: f64, observed_at: i64) -> PriceObservation {
        PriceObservation {
            product_id: ProductId(1),
            site: "A".to_string(),
            price,
            currency: "USD".to_string(),
            url: "https://a.example/p/1".to_string(),
            title: "USB-C Cable 2m".to_string(),
            observed_at,
        }
    }

    async fn make_analyzer_with_prices(
        dir: &tempfile::TempDir,
        prices: &[f64],
    ) -> (TrendAnalyzer, i64) {
        let ledger = Arc::new(SqliteLedger::open(dir.path().join("test.db")).unwrap());
        for (day, price) in prices.iter().enumerate() {
            ledger
                .append(&make_observation(*price, day as i64 * SECS_PER_DAY + 100))
                .await
                .unwrap();
        }
        let now = prices.len() as i64 * SECS_PER_DAY;
        (TrendAnalyzer::new(ledger, 1.0), now)
    }

    #[tokio::test]
    async fn test_single_observation_is_insufficient() {
        let dir = tempdir().unwrap();
        let (analyzer, now) = make_analyzer_with_prices(&dir, &[9.99]).await;

        let err = analyzer
            .analyze(ProductId(1), "A", 7, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrendError::InsufficientData {
                found: 1,
                required: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_two_observations_suffice() {
        let dir = tempdir().unwrap();
        let (analyzer, now) = make_analyzer_with_prices(&dir, &[9.99, 7.99]).await;

        let trend = analyzer.analyze(ProductId(1), "A", 7, now).await.unwrap();
        assert_eq!(trend.sample_count, 2);
        assert_eq!(trend.direction, TrendDirection::Falling);
        // (7.99 - 9.99) / 9.99 * 100 ≈ -20%
        assert!((trend.pct_change - -20.02).abs() < 0.01, "{}", trend.pct_change);
    }

    #[tokio::test]
    async fn test_rising_direction() {
        let dir = tempdir().unwrap();
        let (analyzer, now) = make_analyzer_with_prices(&dir, &[10.0, 11.0, 12.5]).await;

        let trend = analyzer.analyze(ProductId(1), "A", 7, now).await.unwrap();
        assert_eq!(trend.direction, TrendDirection::Rising);
        assert_eq!(trend.pct_change, 25.0);
    }

    #[tokio::test]
    async fn test_flat_within_threshold() {
        let dir = tempdir().unwrap();
        // +0.5% end to end sits inside the default 1% flat band
        let (analyzer, now) = make_analyzer_with_prices(&dir, &[10.0, 10.2, 10.05]).await;

        let trend = analyzer.analyze(ProductId(1), "A", 7, now).await.unwrap();
        assert_eq!(trend.direction, TrendDirection::Flat);
    }

    #[tokio::test]
    async fn test_moving_average() {
        let dir = tempdir().unwrap();
        let (analyzer, now) = make_analyzer_with_prices(&dir, &[10.0, 12.0, 14.0]).await;

        let trend = analyzer.analyze(ProductId(1), "A", 7, now).await.unwrap();
        assert_eq!(trend.moving_avg, 12.0);
    }

    #[tokio::test]
    async fn test_window_excludes_older_observations() {
        let dir = tempdir().unwrap();
        // Six days of history, but only the last two fall in a 2-day window
        let (analyzer, now) =
            make_analyzer_with_prices(&dir, &[50.0, 40.0, 30.0, 20.0, 10.0, 10.0]).await;

        let trend = analyzer.analyze(ProductId(1), "A", 2, now).await.unwrap();
        assert_eq!(trend.sample_count, 2);
        assert_eq!(trend.direction, TrendDirection::Flat);
    }
}
