//! Product identity resolution via fuzzy title matching
//!
//! Candidate identities are restricted to those previously seen for the same
//! search query, which bounds matching cost per record to the handful of
//! products that query has surfaced before. Matching itself never fails:
//! when nothing clears the similarity threshold, a fresh identity is created
//! through the store's insert-if-absent primitive.

use super::catalog::IdentityStore;
use super::errors::StorageError;
use super::types::{NormalizedRecord, ProductIdentity};
use std::collections::HashSet;
use std::sync::Arc;

pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    similarity_threshold: f64,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>, similarity_threshold: f64) -> Self {
        Self {
            store,
            similarity_threshold,
        }
    }

    /// Map a normalized record to a stable product identity.
    ///
    /// Highest-scoring candidate above the threshold wins; ties break toward
    /// the most recently updated identity. A match grows the winner's alias
    /// set; a miss creates a new identity named after the incoming title.
    pub async fn resolve(
        &self,
        record: &NormalizedRecord,
    ) -> Result<ProductIdentity, StorageError> {
        let title_tokens = tokenize(&record.normalized_title);
        let candidates = self.store.candidates_for_query(&record.query).await?;

        let mut best: Option<(f64, &ProductIdentity)> = None;
        for candidate in &candidates {
            let score = candidate_score(candidate, &title_tokens);
            // Candidates arrive most-recently-updated first, so a strict
            // comparison resolves score ties toward the freshest identity
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate));
            }
        }

        if let Some((score, matched)) = best {
            if score >= self.similarity_threshold {
                log::debug!(
                    "🔗 Matched {:?} to product {} (score {:.2})",
                    record.normalized_title,
                    matched.id,
                    score
                );
                self.store
                    .record_alias(matched.id, &record.normalized_title, record.fetched_at)
                    .await?;
                let mut identity = matched.clone();
                if !identity.aliases.contains(&record.normalized_title) {
                    identity.aliases.push(record.normalized_title.clone());
                }
                identity.updated_at = record.fetched_at;
                return Ok(identity);
            }
        }

        let identity = self
            .store
            .insert_if_absent(&record.query, &record.normalized_title, record.fetched_at)
            .await?;
        log::debug!(
            "🆕 New product {} for query {:?}: {:?}",
            identity.id,
            record.query,
            identity.canonical_name
        );
        Ok(identity)
    }
}

/// Best Jaccard score of the title against the candidate's canonical name
/// and every recorded alias.
fn candidate_score(candidate: &ProductIdentity, title_tokens: &HashSet<String>) -> f64 {
    let mut best = jaccard(title_tokens, &tokenize(&candidate.canonical_name));
    for alias in &candidate.aliases {
        let score = jaccard(title_tokens, &tokenize(alias));
        if score > best {
            best = score;
        }
    }
    best
}

/// Word tokens of an already-normalized title.
pub fn tokenize(normalized: &str) -> HashSet<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Token-set overlap ratio: |a ∩ b| / |a ∪ b|. Two empty sets score 0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}
