//! Rank fusion: merging the lexical and semantic tiers into one list
//!
//! The two tiers are disjoint by id (the semantic pass excludes lexical
//! hits), so fusion is a union followed by one sort. Exact lexical matches
//! always outrank any semantic-only match; within a tier the combined score
//! decides, and remaining ties keep their prior order.

use crate::item::KnowledgeItem;
use crate::search::lexical::LexicalMatch;

/// Threshold floor applied once an exact lexical match exists
pub const EXACT_THRESHOLD_FLOOR: f32 = 0.5;

/// Semantic-result cap applied once an exact lexical match exists
pub const EXACT_SEMANTIC_BUDGET: usize = 3;

/// Multiplier lifting cosine similarity into the combined-score scale
pub const SEMANTIC_WEIGHT: f32 = 2.0;

/// Threshold and budget for the semantic pass, decided by exact-match
/// presence.
///
/// Once the corpus has found something the user typed almost verbatim,
/// semantic recall is throttled so near-miss paraphrases don't crowd out
/// exact hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    pub threshold: f32,
    pub budget: usize,
}

impl SearchPolicy {
    pub fn for_exact_presence(has_exact: bool, base_threshold: f32, top_k: usize) -> Self {
        if has_exact {
            Self {
                threshold: base_threshold.max(EXACT_THRESHOLD_FLOOR),
                budget: EXACT_SEMANTIC_BUDGET,
            }
        } else {
            Self {
                threshold: base_threshold,
                budget: top_k,
            }
        }
    }
}

/// One fused result with per-tier scores kept for diagnostics
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub item: KnowledgeItem,
    pub text_score: f32,
    pub semantic_score: f32,
    pub combined_score: f32,
    pub exact: bool,
}

/// Merge the lexical and semantic tiers and sort.
///
/// `semantic` must already be filtered, budget-truncated, and disjoint from
/// `lexical` by item id. Sort order: `(exact, combined_score)` descending,
/// stable on remaining ties.
pub fn fuse(
    lexical: Vec<(KnowledgeItem, LexicalMatch)>,
    semantic: Vec<(KnowledgeItem, f32)>,
) -> Vec<ScoredItem> {
    let mut records: Vec<ScoredItem> = Vec::with_capacity(lexical.len() + semantic.len());

    for (item, m) in lexical {
        records.push(ScoredItem {
            item,
            text_score: m.score,
            semantic_score: 0.0,
            combined_score: m.score,
            exact: m.exact,
        });
    }

    for (item, similarity) in semantic {
        records.push(ScoredItem {
            item,
            text_score: 0.0,
            semantic_score: similarity,
            combined_score: similarity * SEMANTIC_WEIGHT,
            exact: false,
        });
    }

    records.sort_by(|a, b| {
        b.exact.cmp(&a.exact).then(
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64) -> KnowledgeItem {
        KnowledgeItem {
            id,
            title: format!("item {}", id),
            text_content: String::new(),
            original_filename: None,
            tags: Vec::new(),
            content_embedding: None,
            tags_embedding: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lex(score: f32, exact: bool) -> LexicalMatch {
        LexicalMatch { score, exact }
    }

    #[test]
    fn test_policy_without_exact_match() {
        let policy = SearchPolicy::for_exact_presence(false, 0.3, 10);
        assert_eq!(policy, SearchPolicy { threshold: 0.3, budget: 10 });
    }

    #[test]
    fn test_policy_with_exact_match_raises_floor_and_caps_budget() {
        let policy = SearchPolicy::for_exact_presence(true, 0.3, 10);
        assert_eq!(policy, SearchPolicy { threshold: 0.5, budget: 3 });
    }

    #[test]
    fn test_policy_keeps_higher_caller_threshold() {
        let policy = SearchPolicy::for_exact_presence(true, 0.8, 10);
        assert_eq!(policy.threshold, 0.8);
    }

    #[test]
    fn test_exact_outranks_any_semantic_score() {
        let lexical = vec![(item(1), lex(5.0, true))];
        // similarity 0.99 -> combined 1.98, far below 5.0 anyway, but even
        // a huge semantic score must not pass an exact hit
        let semantic = vec![(item(2), 0.99)];

        let fused = fuse(lexical, semantic);
        assert_eq!(fused[0].item.id, 1);
        assert!(fused[0].exact);
    }

    #[test]
    fn test_non_exact_lexical_ranks_by_combined_score() {
        // Non-exact lexical content hit (1.0) vs semantic 0.9 * 2.0 = 1.8
        let lexical = vec![(item(1), lex(1.0, false))];
        let semantic = vec![(item(2), 0.9)];

        let fused = fuse(lexical, semantic);
        assert_eq!(fused[0].item.id, 2);
        assert!((fused[0].combined_score - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_semantic_weight_applied() {
        let fused = fuse(Vec::new(), vec![(item(1), 0.75)]);
        assert_eq!(fused[0].semantic_score, 0.75);
        assert!((fused[0].combined_score - 1.5).abs() < 1e-6);
        assert_eq!(fused[0].text_score, 0.0);
    }

    #[test]
    fn test_lexical_scores_carried_through() {
        let fused = fuse(vec![(item(1), lex(13.0, true))], Vec::new());
        assert_eq!(fused[0].text_score, 13.0);
        assert_eq!(fused[0].combined_score, 13.0);
        assert_eq!(fused[0].semantic_score, 0.0);
    }

    #[test]
    fn test_stable_on_ties() {
        let lexical = vec![
            (item(1), lex(5.0, true)),
            (item(2), lex(5.0, true)),
            (item(3), lex(5.0, true)),
        ];

        let fused = fuse(lexical, Vec::new());
        let ids: Vec<i64> = fused.iter().map(|r| r.item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_full_ordering() {
        let lexical = vec![
            (item(1), lex(1.0, false)),
            (item(2), lex(10.0, true)),
            (item(3), lex(8.0, true)),
        ];
        let semantic = vec![(item(4), 0.9), (item(5), 0.6)];

        let fused = fuse(lexical, semantic);
        let ids: Vec<i64> = fused.iter().map(|r| r.item.id).collect();
        // exact (10, 8) first, then combined: 1.8, 1.2, 1.0
        assert_eq!(ids, vec![2, 3, 4, 5, 1]);
    }
}
