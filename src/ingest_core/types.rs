//! Core data types flowing through the ingestion pipeline

use serde::{Deserialize, Serialize};

pub const SECS_PER_DAY: i64 = 86_400;

/// Raw extraction result produced by a site adaptor for one listing.
///
/// Ephemeral: consumed by the normalizer within one ingestion call and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub site: String,
    pub query: String,
    pub raw_title: String,
    pub raw_price: String,
    pub raw_url: String,
    pub fetched_at: i64,
}

/// Validated, pre-identity form of a raw record.
///
/// `normalized_title` feeds the identity resolver; `display_title` keeps the
/// original casing for display and export.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub site: String,
    pub query: String,
    pub normalized_title: String,
    pub display_title: String,
    pub price: f64,
    pub currency: String,
    pub url: String,
    pub fetched_at: i64,
}

/// Stable opaque key for one real-world product concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cross-site identity for one product, owned by the identity catalog.
///
/// Ledger entries reference `id` only and never mutate the identity.
#[derive(Debug, Clone)]
pub struct ProductIdentity {
    pub id: ProductId,
    pub canonical_name: String,
    pub query: String,
    pub aliases: Vec<String>,
    pub updated_at: i64,
}

/// One price sighting. Immutable once created.
///
/// Deduplication bucket is the UTC day of `observed_at`; the full-precision
/// timestamp is retained for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceObservation {
    pub product_id: ProductId,
    pub site: String,
    pub price: f64,
    pub currency: String,
    pub url: String,
    pub title: String,
    pub observed_at: i64,
}

impl PriceObservation {
    /// Epoch-day bucket used for overwrite-by-day deduplication.
    pub fn day(&self) -> i64 {
        self.observed_at.div_euclid(SECS_PER_DAY)
    }
}

/// Result of appending an observation to the history ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    Overwritten,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "RISING",
            TrendDirection::Falling => "FALLING",
            TrendDirection::Flat => "FLAT",
        }
    }
}

/// Trend signal derived from one product's ledger slice on a single site.
///
/// Computed on demand, never stored.
#[derive(Debug, Clone)]
pub struct TrendResult {
    pub product_id: ProductId,
    pub site: String,
    pub direction: TrendDirection,
    pub pct_change: f64,
    pub moving_avg: f64,
    pub window_days: u32,
    pub sample_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bucket_truncation() {
        let obs = PriceObservation {
            product_id: ProductId(1),
            site: "A".to_string(),
            price: 9.99,
            currency: "USD".to_string(),
            url: "https://example.com/p/1".to_string(),
            title: "USB-C Cable 2m".to_string(),
            observed_at: 3 * SECS_PER_DAY + 12_345,
        };
        assert_eq!(obs.day(), 3);

        // Same day, different time of day -> same bucket
        let later = PriceObservation {
            observed_at: 3 * SECS_PER_DAY + 80_000,
            ..obs.clone()
        };
        assert_eq!(obs.day(), later.day());
    }

    #[test]
    fn test_day_bucket_pre_epoch() {
        let obs = PriceObservation {
            product_id: ProductId(1),
            site: "A".to_string(),
            price: 1.0,
            currency: "USD".to_string(),
            url: "https://example.com".to_string(),
            title: "t".to_string(),
            observed_at: -1,
        };
        // div_euclid keeps buckets aligned across the epoch boundary
        assert_eq!(obs.day(), -1);
    }
}
