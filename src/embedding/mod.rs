//! Embedding generation and vector primitives
//!
//! The provider maps text to fixed-length vectors; `vector` holds the math
//! and the BLOB codec shared by the store and the search engine.

pub mod provider;
pub mod vector;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector::{cosine_distance, cosine_similarity, from_blob, to_blob};
