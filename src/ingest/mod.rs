//! Ingestion pipeline: tags in, embeddings out, one persisted item
//!
//! Normalizes the raw tag string, requests the content embedding (and the
//! consolidated tag embedding when tags survive normalization), then writes
//! a single row. If the embedding provider fails, nothing is persisted.

use std::sync::Arc;
use thiserror::Error;

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::item::{normalize_tags, KnowledgeItem, NewItem};
use crate::store::{ItemRecord, ItemStore, StoreError};

#[derive(Error, Debug)]
pub enum IngestError {
    /// Provider unavailable or rejected the input; the item was not persisted
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The store rejected the write
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

/// Ingestion pipeline over a provider and a store
pub struct IngestPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<ItemStore>,
}

impl IngestPipeline {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<ItemStore>) -> Self {
        Self { provider, store }
    }

    /// Ingest a new item: normalize tags, embed, persist.
    ///
    /// The content embedding is always requested, even for empty content;
    /// rejecting empty content is the caller's job. The tag embedding is
    /// requested only when normalization leaves at least one tag, over the
    /// tags joined by a single space, so `tags_embedding` is present iff
    /// `tags` is non-empty.
    pub fn ingest(&self, new_item: NewItem) -> Result<KnowledgeItem, IngestError> {
        let tags = normalize_tags(new_item.tags_csv.as_deref());

        let content_embedding = self.provider.embed(&new_item.text_content)?;

        let tags_embedding = if tags.is_empty() {
            None
        } else {
            Some(self.provider.embed(&tags.join(" "))?)
        };

        let item = self.store.insert(ItemRecord {
            title: new_item.title,
            text_content: new_item.text_content,
            original_filename: new_item.original_filename,
            tags,
            content_embedding: Some(content_embedding),
            tags_embedding,
        })?;

        tracing::info!(
            item_id = item.id,
            title = %item.title,
            tags = item.tags.len(),
            "Ingested knowledge item"
        );

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;

    /// Deterministic provider: vector derived from text length
    struct StubProvider {
        dimension: usize,
        fail: bool,
    }

    impl EmbeddingProvider for StubProvider {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if self.fail {
                return Err(EmbeddingError::GenerationError("stub failure".to_string()));
            }
            let mut v = vec![0.0; self.dimension];
            v[0] = 1.0;
            v[1] = (text.len() % 7) as f32 / 7.0;
            Ok(v)
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            texts.iter().map(|t| self.embed(t)).collect()
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn pipeline(fail: bool) -> (IngestPipeline, Arc<ItemStore>) {
        let store = Arc::new(ItemStore::open_in_memory().unwrap());
        let provider = Arc::new(StubProvider { dimension: 4, fail });
        (IngestPipeline::new(provider, store.clone()), store)
    }

    #[test]
    fn test_ingest_with_tags_sets_both_embeddings() {
        let (pipeline, _store) = pipeline(false);

        let item = pipeline
            .ingest(NewItem::note("Rust Ownership", "moves and borrows").with_tags("rust, memory"))
            .unwrap();

        assert_eq!(item.tags, vec!["rust", "memory"]);
        assert!(item.content_embedding.is_some());
        assert!(item.tags_embedding.is_some());
    }

    #[test]
    fn test_ingest_without_tags_omits_tag_embedding() {
        let (pipeline, _store) = pipeline(false);

        let item = pipeline
            .ingest(NewItem::note("Untitled", "some text"))
            .unwrap();

        assert!(item.tags.is_empty());
        assert!(item.tags_embedding.is_none());
        assert!(item.content_embedding.is_some());
    }

    #[test]
    fn test_ingest_blank_tag_string_treated_as_empty() {
        let (pipeline, _store) = pipeline(false);

        let item = pipeline
            .ingest(NewItem::note("n", "t").with_tags("  ,  ,"))
            .unwrap();

        assert!(item.tags.is_empty());
        assert!(item.tags_embedding.is_none());
    }

    #[test]
    fn test_embedding_failure_persists_nothing() {
        let (pipeline, store) = pipeline(true);

        let result = pipeline.ingest(NewItem::note("doomed", "text"));

        assert!(matches!(result, Err(IngestError::Embedding(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_original_filename_preserved() {
        let (pipeline, _store) = pipeline(false);

        let item = pipeline
            .ingest(NewItem::note("paper", "extracted text").from_file("paper.pdf"))
            .unwrap();

        assert_eq!(item.original_filename.as_deref(), Some("paper.pdf"));
        assert!(item.is_document());
    }
}
