//! Lexical matcher: additive case-insensitive scoring of one item
//!
//! Scoring rules, applied cumulatively:
//! - query equals title:              +10.0, exact
//! - query is a substring of title:    +5.0, exact
//! - query equals a tag (per tag):     +8.0, exact
//! - query inside a tag (per tag):     +3.0
//! - query inside the text body:       +1.0
//!
//! A query that is an exact title or tag hit marks the item `exact`, which
//! later drives the fusion policy. An item participates only when its total
//! score is positive.

use crate::item::KnowledgeItem;

pub const TITLE_EQUAL: f32 = 10.0;
pub const TITLE_SUBSTRING: f32 = 5.0;
pub const TAG_EQUAL: f32 = 8.0;
pub const TAG_SUBSTRING: f32 = 3.0;
pub const CONTENT_SUBSTRING: f32 = 1.0;

/// Outcome of matching one item against a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalMatch {
    pub score: f32,
    pub exact: bool,
}

impl LexicalMatch {
    pub fn is_hit(&self) -> bool {
        self.score > 0.0
    }
}

/// Score a single item against a query string
pub fn score_item(item: &KnowledgeItem, query: &str) -> LexicalMatch {
    let query = query.to_lowercase();
    let title = item.title.to_lowercase();

    let mut score = 0.0;
    let mut exact = false;

    if title == query {
        score += TITLE_EQUAL;
        exact = true;
    } else if title.contains(&query) {
        score += TITLE_SUBSTRING;
        exact = true;
    }

    for tag in &item.tags {
        let tag = tag.to_lowercase();
        if tag == query {
            score += TAG_EQUAL;
            exact = true;
        } else if tag.contains(&query) {
            score += TAG_SUBSTRING;
        }
    }

    if item.text_content.to_lowercase().contains(&query) {
        score += CONTENT_SUBSTRING;
    }

    LexicalMatch { score, exact }
}
