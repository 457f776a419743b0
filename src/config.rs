//! Core configuration loaded from environment variables

use std::env;

/// Time bucket at which two observations of the same product and site are
/// considered the same for overwrite purposes. Day is the only granularity
/// the ledger supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupGranularity {
    Day,
}

impl DedupGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupGranularity::Day => "day",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Some(DedupGranularity::Day),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Tunables consumed by the ingestion core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Applied when a raw price carries no recognizable currency.
    pub default_currency: String,
    /// Jaccard acceptance threshold for identity matching, in (0, 1].
    pub similarity_threshold: f64,
    /// Percent band inside which a price change counts as flat.
    pub trend_flat_threshold_pct: f64,
    pub dedup_granularity: DedupGranularity,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            similarity_threshold: 0.6,
            trend_flat_threshold_pct: 1.0,
            dedup_granularity: DedupGranularity::Day,
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Variables: DEFAULT_CURRENCY, SIMILARITY_THRESHOLD,
    /// TREND_FLAT_THRESHOLD_PCT, DEDUP_GRANULARITY.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let default_currency = env::var("DEFAULT_CURRENCY")
            .map(|s| s.trim().to_ascii_uppercase())
            .unwrap_or(defaults.default_currency);
        if default_currency.is_empty() {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_CURRENCY cannot be empty".to_string(),
            ));
        }

        let similarity_threshold = match env::var("SIMILARITY_THRESHOLD") {
            Ok(raw) => raw.parse::<f64>().map_err(|_| {
                ConfigError::InvalidValue(format!("SIMILARITY_THRESHOLD not a number: {}", raw))
            })?,
            Err(_) => defaults.similarity_threshold,
        };
        if !(similarity_threshold > 0.0 && similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "SIMILARITY_THRESHOLD must be in (0, 1], got {}",
                similarity_threshold
            )));
        }

        let trend_flat_threshold_pct = match env::var("TREND_FLAT_THRESHOLD_PCT") {
            Ok(raw) => raw.parse::<f64>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "TREND_FLAT_THRESHOLD_PCT not a number: {}",
                    raw
                ))
            })?,
            Err(_) => defaults.trend_flat_threshold_pct,
        };
        if trend_flat_threshold_pct < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "TREND_FLAT_THRESHOLD_PCT must be non-negative, got {}",
                trend_flat_threshold_pct
            )));
        }

        let dedup_granularity = match env::var("DEDUP_GRANULARITY") {
            Ok(raw) => DedupGranularity::parse(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "DEDUP_GRANULARITY must be \"day\", got {:?}",
                    raw
                ))
            })?,
            Err(_) => defaults.dedup_granularity,
        };

        Ok(Self {
            default_currency,
            similarity_threshold,
            trend_flat_threshold_pct,
            dedup_granularity,
        })
    }
}
