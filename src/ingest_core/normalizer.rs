//! Record normalization from raw per-site extraction results
//!
//! Pure over its input: no side effects, record-scoped failures only.

use super::errors::ValidationError;
use super::types::{NormalizedRecord, RawRecord};

/// Currency symbols recognized anywhere in a raw price string.
const CURRENCY_SYMBOLS: &[(char, &str)] = &[
    ('$', "USD"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
];

/// ISO 4217 codes recognized as standalone alphabetic tokens.
const CURRENCY_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY", "INR", "SEK", "NOK", "DKK", "PLN",
];

/// Converts raw records into validated, pre-identity observations.
pub struct Normalizer {
    default_currency: String,
}

impl Normalizer {
    pub fn new(default_currency: impl Into<String>) -> Self {
        Self {
            default_currency: default_currency.into(),
        }
    }

    /// Validate and normalize one raw record.
    ///
    /// When the raw price carries no recognizable currency, the configured
    /// default is applied; the chosen code is recorded on the record either
    /// way, so the heuristic is visible downstream.
    pub fn normalize(&self, raw: &RawRecord) -> Result<NormalizedRecord, ValidationError> {
        let display_title = raw.raw_title.trim();
        if display_title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let normalized_title = normalize_title(display_title);
        if normalized_title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let (price, detected_currency) = parse_price(&raw.raw_price)
            .ok_or_else(|| ValidationError::UnparseablePrice(raw.raw_price.clone()))?;
        if price <= 0.0 {
            return Err(ValidationError::UnparseablePrice(raw.raw_price.clone()));
        }

        if !is_well_formed_url(&raw.raw_url) {
            return Err(ValidationError::MalformedUrl(raw.raw_url.clone()));
        }

        let currency = detected_currency.unwrap_or_else(|| self.default_currency.clone());

        Ok(NormalizedRecord {
            site: raw.site.clone(),
            query: raw.query.clone(),
            normalized_title,
            display_title: display_title.to_string(),
            price,
            currency,
            url: raw.raw_url.clone(),
            fetched_at: raw.fetched_at,
        })
    }
}

/// Lowercase a title and collapse every non-alphanumeric run to a single
/// space. Output feeds the token-set matcher in the identity resolver.
pub fn normalize_title(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a raw price string into an amount and the detected currency.
///
/// Accepted formats: a currency symbol or ISO code before or after the
/// amount ("$9.99", "9.99 USD", "EUR 1.299,00"), thousands separators
/// ("1,299.00"), comma decimals ("9,99"). The final `.` or `,` followed by
/// one or two digits is the decimal separator; all other separators are
/// treated as grouping. Returns None when no numeric token is present.
pub fn parse_price(raw: &str) -> Option<(f64, Option<String>)> {
    let amount = extract_number(raw)?;
    Some((amount, detect_currency(raw)))
}

fn detect_currency(raw: &str) -> Option<String> {
    for c in raw.chars() {
        if let Some((_, code)) = CURRENCY_SYMBOLS.iter().find(|(sym, _)| *sym == c) {
            return Some((*code).to_string());
        }
    }

    for token in raw.split(|c: char| !c.is_ascii_alphabetic()) {
        if token.is_empty() {
            continue;
        }
        let upper = token.to_ascii_uppercase();
        if CURRENCY_CODES.contains(&upper.as_str()) {
            return Some(upper);
        }
    }

    None
}

fn extract_number(raw: &str) -> Option<f64> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let tail = &raw[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(tail.len());
    let token = tail[..end].trim_end_matches(['.', ',']);
    parse_numeric_token(token)
}

fn parse_numeric_token(token: &str) -> Option<f64> {
    if token.is_empty() {
        return None;
    }

    let last_sep = token
        .char_indices()
        .filter(|(_, c)| *c == '.' || *c == ',')
        .map(|(i, _)| i)
        .last();

    let cleaned = match last_sep {
        None => token.to_string(),
        Some(last) => {
            let decimals = token.len() - last - 1;
            if (1..=2).contains(&decimals) {
                // Final separator is the decimal point
                let mut s = String::with_capacity(token.len());
                for (i, c) in token.char_indices() {
                    match c {
                        '.' | ',' => {
                            if i == last {
                                s.push('.');
                            }
                        }
                        _ => s.push(c),
                    }
                }
                s
            } else {
                // Grouping only ("1,299" -> 1299)
                token.chars().filter(|c| c.is_ascii_digit()).collect()
            }
        }
    };

    cleaned.parse::<f64>().ok()
}

fn is_well_formed_url(raw: &str) -> bool {
    let rest = match raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    !host.is_empty() && !host.contains(char::is_whitespace)
}
