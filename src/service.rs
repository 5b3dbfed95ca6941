//! Knowledge service: the explicitly-constructed application object
//!
//! Owns the embedding provider and the item store, built once at process
//! start and passed into whatever surface drives it (the CLI here). There
//! is no lazily-initialized global model state; construction is eager and
//! failures surface immediately.

use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedProvider};
use crate::error::{MnemaError, Result};
use crate::ingest::IngestPipeline;
use crate::item::{KnowledgeItem, NewItem};
use crate::search::{ScoredItem, SearchEngine};
use crate::store::{ItemStore, StoreStats};

/// The application service: one provider, one store, both shared by the
/// ingestion pipeline and the search engine.
pub struct KnowledgeService {
    store: Arc<ItemStore>,
    pipeline: IngestPipeline,
    engine: SearchEngine,
}

impl KnowledgeService {
    /// Open the service from configuration, loading the embedding model
    /// and migrating the store.
    pub fn open(config: &Config) -> Result<Self> {
        let provider = Arc::new(FastEmbedProvider::new(&config.embedding.model)?);

        if provider.dimension() != config.embedding.dimension {
            return Err(MnemaError::InvalidConfigValue {
                path: "embedding.dimension".to_string(),
                message: format!(
                    "model {} produces {}-dimensional vectors, configured {}",
                    config.embedding.model,
                    provider.dimension(),
                    config.embedding.dimension
                ),
            });
        }

        let store = Arc::new(ItemStore::open(&config.db_path())?);

        Ok(Self::with_parts(provider, store, config))
    }

    /// Assemble the service from preconstructed parts (tests inject a
    /// deterministic provider here).
    pub fn with_parts(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<ItemStore>,
        config: &Config,
    ) -> Self {
        let pipeline = IngestPipeline::new(provider.clone(), store.clone());
        let engine = SearchEngine::new(provider, store.clone(), config.search.clone());

        Self {
            store,
            pipeline,
            engine,
        }
    }

    /// Ingest a new knowledge item
    pub fn ingest(&self, new_item: NewItem) -> Result<KnowledgeItem> {
        Ok(self.pipeline.ingest(new_item)?)
    }

    /// Hybrid lexical + semantic search
    pub fn hybrid_search(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredItem>> {
        Ok(self.engine.hybrid_search(query, top_k, threshold)?)
    }

    /// Hybrid search with configured defaults
    pub fn hybrid_search_with_defaults(&self, query: &str) -> Result<Vec<ScoredItem>> {
        Ok(self.engine.hybrid_search_with_defaults(query)?)
    }

    /// Tag nearest-neighbor search
    pub fn tag_search(&self, query_tags: &str, k: usize) -> Result<Vec<KnowledgeItem>> {
        Ok(self.engine.tag_search(query_tags, k)?)
    }

    /// All items in stable id order
    pub fn list(&self) -> Result<Vec<KnowledgeItem>> {
        Ok(self.store.scan_all()?)
    }

    /// Fetch one item
    pub fn get(&self, id: i64) -> Result<KnowledgeItem> {
        self.store
            .get(id)?
            .ok_or(MnemaError::ItemNotFound { id })
    }

    /// Delete one item
    pub fn delete(&self, id: i64) -> Result<()> {
        if self.store.delete(id)? {
            tracing::info!(item_id = id, "Deleted knowledge item");
            Ok(())
        } else {
            Err(MnemaError::ItemNotFound { id })
        }
    }

    /// Store statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(self.store.stats()?)
    }
}
