//! pricewatch - cross-site product price tracking core
//!
//! Ingests raw per-site extraction results, normalizes them into canonical
//! price observations, resolves a stable product identity across sites, and
//! maintains a deduplicated, time-ordered price history with on-demand
//! trend analysis.

pub mod adaptors;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod ingest_core;
pub mod sqlite_pragma;


pub use adaptors::{AdaptorError, JsonlAdaptor, SiteAdaptor};
pub use config::{ConfigError, CoreConfig, DedupGranularity};
pub use dashboard::Dashboard;
pub use export::{export_query, ExportError};
pub use ingest_core::{
    run_ingestion, AppendOutcome, BatchSummary, IdentityResolver, IdentityStore, IngestError,
    IngestPipeline, LedgerStore, Normalizer, PriceObservation, ProductId, ProductIdentity,
    RawRecord, SqliteCatalog, SqliteLedger, StorageError, TrendAnalyzer, TrendDirection,
    TrendError, TrendResult, ValidationError,
};
