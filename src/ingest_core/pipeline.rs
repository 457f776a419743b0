//! Ingest pipeline: normalize → resolve identity → append to ledger
//!
//! Failures are record-scoped. A malformed record is skipped with a warning,
//! a storage failure is reported for that record alone; neither aborts the
//! batch or the scrape run it belongs to.

use super::catalog::IdentityStore;
use super::errors::IngestError;
use super::ledger::LedgerStore;
use super::normalizer::Normalizer;
use super::resolver::IdentityResolver;
use super::types::{AppendOutcome, PriceObservation, RawRecord};
use crate::config::CoreConfig;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-batch ingestion tally.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub inserted: usize,
    pub overwritten: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.overwritten + self.skipped + self.failed
    }
}

pub struct IngestPipeline {
    normalizer: Normalizer,
    resolver: IdentityResolver,
    ledger: Arc<dyn LedgerStore>,
}

impl IngestPipeline {
    pub fn new(
        config: &CoreConfig,
        catalog: Arc<dyn IdentityStore>,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(config.default_currency.clone()),
            resolver: IdentityResolver::new(catalog, config.similarity_threshold),
            ledger,
        }
    }

    /// Run one raw record through the full pipeline.
    pub async fn ingest_record(&self, raw: &RawRecord) -> Result<AppendOutcome, IngestError> {
        let record = self.normalizer.normalize(raw)?;
        let identity = self.resolver.resolve(&record).await?;

        let observation = PriceObservation {
            product_id: identity.id,
            site: record.site,
            price: record.price,
            currency: record.currency,
            url: record.url,
            title: record.display_title,
            observed_at: record.fetched_at,
        };

        Ok(self.ledger.append(&observation).await?)
    }

    /// Ingest a batch of raw records, tolerating per-record failures.
    pub async fn ingest_batch(&self, records: &[RawRecord]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for raw in records {
            match self.ingest_record(raw).await {
                Ok(AppendOutcome::Inserted) => summary.inserted += 1,
                Ok(AppendOutcome::Overwritten) => summary.overwritten += 1,
                Err(IngestError::Validation(e)) => {
                    log::warn!(
                        "⚠️  Skipping record from {} ({:?}): {}",
                        raw.site,
                        raw.raw_title,
                        e
                    );
                    summary.skipped += 1;
                }
                Err(IngestError::Storage(e)) => {
                    log::error!("❌ Failed to store record from {}: {}", raw.site, e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

/// Drain raw records from the adaptor channel until every sender is dropped.
///
/// This is the single ingestion loop: adaptors run concurrently and feed one
/// channel, so identity resolution for any given query is serialized here.
/// Returns the run's combined tally.
pub async fn run_ingestion(
    mut rx: mpsc::Receiver<RawRecord>,
    pipeline: Arc<IngestPipeline>,
) -> BatchSummary {
    log::info!("🚀 Ingestion loop started, waiting for records...");

    let mut summary = BatchSummary::default();

    while let Some(raw) = rx.recv().await {
        let site = raw.site.clone();
        match pipeline.ingest_record(&raw).await {
            Ok(AppendOutcome::Inserted) => summary.inserted += 1,
            Ok(AppendOutcome::Overwritten) => summary.overwritten += 1,
            Err(IngestError::Validation(e)) => {
                log::warn!("⚠️  Skipping record from {} ({:?}): {}", site, raw.raw_title, e);
                summary.skipped += 1;
            }
            Err(IngestError::Storage(e)) => {
                log::error!("❌ Failed to store record from {}: {}", site, e);
                summary.failed += 1;
            }
        }

        if summary.total() % 100 == 0 {
            log::debug!("📊 Processed {} records so far", summary.total());
        }
    }

    log::info!(
        "✅ Ingestion complete: {} inserted, {} overwritten, {} skipped, {} failed",
        summary.inserted,
        summary.overwritten,
        summary.skipped,
        summary.failed
    );

    summary
}
