//! Search engine: hybrid retrieval and tag nearest-neighbor search
//!
//! Hybrid flow: one full scan feeds the lexical matcher, the exact-match
//! presence picks the semantic threshold/budget policy, the semantic pass
//! runs over the same snapshot excluding lexical ids, and fusion merges the
//! two tiers. Tag search is an independent path over the store's
//! nearest-neighbor primitive.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::embedding::EmbeddingProvider;
use crate::item::{normalize_tags, KnowledgeItem};
use crate::search::fusion::{fuse, ScoredItem, SearchPolicy};
use crate::search::lexical::{score_item, LexicalMatch};
use crate::search::{semantic, SearchError};
use crate::store::ItemStore;

/// Search engine over a provider and a store
pub struct SearchEngine {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<ItemStore>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<ItemStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Hybrid search: lexical tier plus threshold-gated semantic tier.
    ///
    /// Returns at most `top_k` records sorted by `(exact, combined_score)`
    /// descending. Per-tier scores stay on each record for diagnostics; the
    /// query is embedded at most once per call. An empty query is accepted
    /// and degenerates to an all-lexical result (every field contains the
    /// empty substring).
    pub fn hybrid_search(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredItem>, SearchError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let items = self.store.scan_all()?;
        if items.is_empty() {
            // No candidates, no embedding call
            return Ok(Vec::new());
        }

        // Lexical tier over the full snapshot
        let mut lexical: Vec<(KnowledgeItem, LexicalMatch)> = Vec::new();
        let mut lexical_ids: HashSet<i64> = HashSet::new();
        let mut has_exact = false;

        for item in &items {
            let m = score_item(item, query);
            if m.is_hit() {
                has_exact |= m.exact;
                lexical_ids.insert(item.id);
                lexical.push((item.clone(), m));
            }
        }

        let policy = SearchPolicy::for_exact_presence(has_exact, threshold, top_k);

        // Semantic tier, excluding ids the lexical tier already claimed.
        // Skip the embedding call entirely when no candidate remains.
        let has_candidates = items
            .iter()
            .any(|i| !lexical_ids.contains(&i.id) && i.content_embedding.is_some());

        let semantic_hits: Vec<(KnowledgeItem, f32)> = if has_candidates {
            let query_embedding = self.provider.embed(query)?;

            let mut hits = semantic::scan(
                &query_embedding,
                &items,
                policy.threshold,
                &lexical_ids,
                self.scan_budget(),
            )?;
            // Truncate on the store-order sequence; the final sort happens
            // in fusion
            hits.truncate(policy.budget);

            hits.into_iter()
                .map(|(index, similarity)| (items[index].clone(), similarity))
                .collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            query,
            lexical = lexical.len(),
            semantic = semantic_hits.len(),
            has_exact,
            threshold = policy.threshold,
            budget = policy.budget,
            "Hybrid search tiers computed"
        );

        let mut fused = fuse(lexical, semantic_hits);
        fused.truncate(top_k);

        Ok(fused)
    }

    /// Hybrid search with the configured default limit and threshold
    pub fn hybrid_search_with_defaults(&self, query: &str) -> Result<Vec<ScoredItem>, SearchError> {
        self.hybrid_search(
            query,
            self.config.default_top_k,
            self.config.default_threshold,
        )
    }

    /// Tag search: nearest neighbors over consolidated tag embeddings.
    ///
    /// The query is normalized exactly like ingestion tags; an empty
    /// effective query is an error, not an empty result. Results come back
    /// in ascending cosine-distance order, at most `k` of them, and only
    /// from items that have a tag embedding.
    pub fn tag_search(&self, query_tags: &str, k: usize) -> Result<Vec<KnowledgeItem>, SearchError> {
        let tags = normalize_tags(Some(query_tags));
        if tags.is_empty() {
            return Err(SearchError::InvalidQuery(
                "Provide at least one non-empty tag".to_string(),
            ));
        }

        let query_embedding = self.provider.embed(&tags.join(" "))?;
        let neighbors = self.store.nearest_by_tags(&query_embedding, k)?;

        tracing::debug!(
            query = query_tags,
            results = neighbors.len(),
            "Tag nearest-neighbor search"
        );

        Ok(neighbors.into_iter().map(|(item, _distance)| item).collect())
    }

    fn scan_budget(&self) -> Option<Duration> {
        if self.config.scan_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.config.scan_timeout_ms))
        }
    }
}
