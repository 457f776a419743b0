//! JSONL fixture adaptor
//!
//! Reads pre-extracted listing rows from a per-site JSONL file and stamps
//! them into raw records. Stands in for live retailer adaptors in demos and
//! tests; malformed lines are extraction noise and are skipped with a
//! warning rather than failing the fetch.

use super::{AdaptorError, SiteAdaptor};
use crate::ingest_core::types::RawRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One extracted listing as it appears on disk.
#[derive(Debug, Deserialize)]
struct Listing {
    title: String,
    price: String,
    url: String,
    #[serde(default)]
    fetched_at: Option<i64>,
}

pub struct JsonlAdaptor {
    site: String,
    path: PathBuf,
}

impl JsonlAdaptor {
    pub fn new(site: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            site: site.into(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SiteAdaptor for JsonlAdaptor {
    fn site(&self) -> &str {
        &self.site
    }

    async fn fetch(&self, query: &str) -> Result<Vec<RawRecord>, AdaptorError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let now = chrono::Utc::now().timestamp();

        let mut records = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Listing>(line) {
                Ok(listing) => records.push(RawRecord {
                    site: self.site.clone(),
                    query: query.to_string(),
                    raw_title: listing.title,
                    raw_price: listing.price,
                    raw_url: listing.url,
                    fetched_at: listing.fetched_at.unwrap_or(now),
                }),
                Err(e) => {
                    log::warn!("⚠️  Skipping malformed listing in {}: {}", self.site, e);
                }
            }
        }

        log::info!(
            "📥 {} yielded {} listing(s) for {:?}",
            self.site,
            records.len(),
            query
        );

        Ok(records)
    }
}
