//! Site adaptor boundary
//!
//! One adaptor per retailer, each an independently swappable implementation
//! of the same capability: yield raw extraction records for a search query.
//! Page fetching and HTML parsing live behind this boundary; the pipeline
//! only ever sees the `RawRecord` contract.

use crate::ingest_core::types::RawRecord;
use async_trait::async_trait;

pub mod jsonl;

pub use jsonl::JsonlAdaptor;

#[derive(Debug)]
pub enum AdaptorError {
    Io(std::io::Error),
}

impl From<std::io::Error> for AdaptorError {
    fn from(err: std::io::Error) -> Self {
        AdaptorError::Io(err)
    }
}

impl std::fmt::Display for AdaptorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdaptorError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for AdaptorError {}

/// Capability interface implemented once per retailer.
#[async_trait]
pub trait SiteAdaptor: Send + Sync {
    /// Site label stamped on every record this adaptor yields.
    fn site(&self) -> &str;

    /// Fetch the current listings for a query as raw records.
    async fn fetch(&self, query: &str) -> Result<Vec<RawRecord>, AdaptorError>;
}
