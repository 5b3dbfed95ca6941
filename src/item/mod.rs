//! Knowledge item entity and tag normalization
//!
//! A knowledge item is one stored note or imported document: title, text
//! body, optional free-text tags, and the embedding vectors derived from
//! them. Both search paths read this one representation; the row-to-entity
//! mapping lives in the store adapter so the scan path and the
//! nearest-neighbor path never diverge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored unit of knowledge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    /// Store-assigned identifier, immutable after creation
    pub id: i64,

    /// Non-empty display title
    pub title: String,

    /// Text body (note text or document-extracted text); may be large
    pub text_content: String,

    /// Present only if the item originated from an imported file
    pub original_filename: Option<String>,

    /// Normalized tags, order of first occurrence preserved
    pub tags: Vec<String>,

    /// Embedding of `text_content`; absent only if generation was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_embedding: Option<Vec<f32>>,

    /// Embedding of the space-joined tags; present iff `tags` is non-empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags_embedding: Option<Vec<f32>>,

    pub created_at: DateTime<Utc>,

    /// Advances on every mutation
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeItem {
    /// Whether the item was imported from a file rather than typed in
    pub fn is_document(&self) -> bool {
        self.original_filename.is_some()
    }
}

/// Input for the ingestion pipeline, before embeddings exist
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub text_content: String,
    pub original_filename: Option<String>,
    /// Raw comma-separated tag string as typed by the user
    pub tags_csv: Option<String>,
}

impl NewItem {
    pub fn note(title: impl Into<String>, text_content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text_content: text_content.into(),
            original_filename: None,
            tags_csv: None,
        }
    }

    pub fn with_tags(mut self, tags_csv: impl Into<String>) -> Self {
        self.tags_csv = Some(tags_csv.into());
        self
    }

    pub fn from_file(mut self, filename: impl Into<String>) -> Self {
        self.original_filename = Some(filename.into());
        self
    }
}

/// Normalize a raw comma-separated tag string.
///
/// Split on `,`, trim surrounding whitespace, drop empty pieces. Order of
/// first occurrence is preserved and duplicates are NOT removed; the
/// consolidated tag embedding is derived from exactly this sequence.
pub fn normalize_tags(tags_csv: Option<&str>) -> Vec<String> {
    match tags_csv {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        None => Vec::new(),
    }
}
