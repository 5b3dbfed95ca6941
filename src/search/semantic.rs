//! Semantic matcher: flat cosine scan over content embeddings
//!
//! Runs against every item whose content embedding is present. Items with
//! an absent embedding are skipped outright, never treated as
//! zero-similarity. Candidate order is the store's iteration order; no
//! re-sort happens at this stage.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::embedding::cosine_similarity;
use crate::item::KnowledgeItem;
use crate::search::SearchError;

/// Scan `items` for content embeddings with `similarity >= threshold`.
///
/// `exclude` holds item ids already claimed by the lexical tier. Candidates
/// whose vector length differs from the query are excluded with a warning:
/// fatal for that one comparison, never for the whole scan. The optional
/// `time_budget` bounds the O(corpus) pass.
///
/// Returns `(index into items, similarity)` pairs in input order.
pub fn scan(
    query: &[f32],
    items: &[KnowledgeItem],
    threshold: f32,
    exclude: &HashSet<i64>,
    time_budget: Option<Duration>,
) -> Result<Vec<(usize, f32)>, SearchError> {
    let started = Instant::now();
    let mut hits = Vec::new();

    for (index, item) in items.iter().enumerate() {
        if let Some(budget) = time_budget {
            if started.elapsed() >= budget {
                return Err(SearchError::ScanTimeout {
                    budget_ms: budget.as_millis() as u64,
                });
            }
        }

        if exclude.contains(&item.id) {
            continue;
        }

        let embedding = match &item.content_embedding {
            Some(v) => v,
            None => continue,
        };

        if embedding.len() != query.len() {
            tracing::warn!(
                item_id = item.id,
                expected = query.len(),
                actual = embedding.len(),
                "Skipping item with mismatched content-embedding dimension"
            );
            continue;
        }

        let similarity = cosine_similarity(query, embedding);
        if similarity >= threshold {
            hits.push((index, similarity));
        }
    }

    Ok(hits)
}
