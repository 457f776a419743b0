//! Ingest Core - Price History Ingestion Pipeline
//!
//! Turns raw, heterogeneous per-site extraction results into a consistent,
//! deduplicated, time-ordered price history.
//!
//! # Architecture
//!
//! ```text
//! Site adaptors (one task per site) → mpsc channel
//!     ↓
//! Normalizer (price/currency parsing, title cleanup, URL validation)
//!     ↓
//! IdentityResolver (per-query fuzzy matching → ProductIdentity)
//!     ↓
//! LedgerStore (upsert keyed by product, site, day)
//!     ↓
//! TrendAnalyzer / Dashboard / Export (reads)
//! ```

pub mod catalog;
pub mod errors;
pub mod ledger;
pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod trend;
pub mod types;

pub use catalog::{IdentityStore, SqliteCatalog};
pub use errors::{IngestError, StorageError, TrendError, ValidationError};
pub use ledger::{LedgerStore, SqliteLedger};
pub use normalizer::Normalizer;
pub use pipeline::{run_ingestion, BatchSummary, IngestPipeline};
pub use resolver::IdentityResolver;
pub use trend::TrendAnalyzer;
pub use types::{
    AppendOutcome, NormalizedRecord, PriceObservation, ProductId, ProductIdentity, RawRecord,
    TrendDirection, TrendResult, SECS_PER_DAY,
};
