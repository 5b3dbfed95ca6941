//! Hybrid retrieval: lexical matching, semantic matching, rank fusion
//!
//! The lexical tier scores literal case-insensitive matches; the semantic
//! tier scans cosine similarity over content embeddings; fusion merges the
//! two into one deduplicated, ordered list. Tag nearest-neighbor search is
//! a separate flow that never fuses with lexical scores.

pub mod engine;
pub mod fusion;
pub mod lexical;
pub mod semantic;

pub use engine::SearchEngine;
pub use fusion::{ScoredItem, SearchPolicy};
pub use lexical::{score_item, LexicalMatch};

use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Item store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Semantic scan exceeded its {budget_ms}ms time budget")]
    ScanTimeout { budget_ms: u64 },
}
