//! Mnema - Local Knowledge Store with Hybrid Retrieval
//!
//! Stores short notes and document-derived text tagged with free-text
//! labels, and retrieves them by queries that match literally (title, tag,
//! or content substrings) or only semantically (paraphrase, synonym,
//! different language). Retrieval fuses exact lexical matching with
//! vector-similarity matching over two embedding spaces: document content
//! and consolidated tags.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod item;
pub mod search;
pub mod service;
pub mod store;

pub use error::{MnemaError, Result};
pub use item::{KnowledgeItem, NewItem};
pub use service::KnowledgeService;
