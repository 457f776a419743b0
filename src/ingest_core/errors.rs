//! Error taxonomy for the ingestion pipeline
//!
//! All failures are record-scoped: a bad record is skipped (validation) or
//! reported (storage) without aborting the batch it arrived in.

/// Malformed raw input. Recoverable; the offending record is skipped and
/// logged by the caller, the pipeline continues.
#[derive(Debug)]
pub enum ValidationError {
    /// No numeric token in the raw price, or a non-positive value.
    UnparseablePrice(String),
    /// URL without an http/https scheme or without a host.
    MalformedUrl(String),
    /// Listing without a usable title.
    EmptyTitle,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::UnparseablePrice(raw) => {
                write!(f, "unparseable price: {:?}", raw)
            }
            ValidationError::MalformedUrl(raw) => write!(f, "malformed url: {:?}", raw),
            ValidationError::EmptyTitle => write!(f, "empty product title"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Ledger or catalog read/write failure. Hard failure for the record at
/// hand; other records in the same batch are unaffected.
#[derive(Debug)]
pub enum StorageError {
    Database(rusqlite::Error),
    Io(std::io::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(e) => write!(f, "database error: {}", e),
            StorageError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

/// Trend analysis failure, surfaced to readers as an explicit
/// "no trend yet" state rather than a crash.
#[derive(Debug)]
pub enum TrendError {
    InsufficientData { found: usize, required: usize },
    Storage(StorageError),
}

impl From<StorageError> for TrendError {
    fn from(err: StorageError) -> Self {
        TrendError::Storage(err)
    }
}

impl std::fmt::Display for TrendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendError::InsufficientData { found, required } => write!(
                f,
                "insufficient data: {} observation(s) in window, need at least {}",
                found, required
            ),
            TrendError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for TrendError {}

/// Per-record ingestion failure: either the record was malformed or the
/// ledger rejected the write.
#[derive(Debug)]
pub enum IngestError {
    Validation(ValidationError),
    Storage(StorageError),
}

impl From<ValidationError> for IngestError {
    fn from(err: ValidationError) -> Self {
        IngestError::Validation(err)
    }
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        IngestError::Storage(err)
    }
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Validation(e) => write!(f, "validation error: {}", e),
            IngestError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for IngestError {}
