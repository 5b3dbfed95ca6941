//! Integration tests for the ingestion pipeline against a file-backed store

use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;

use mnema::config::Config;
use mnema::embedding::{EmbeddingError, EmbeddingProvider};
use mnema::ingest::IngestError;
use mnema::store::ItemStore;
use mnema::{KnowledgeService, NewItem};

/// Deterministic provider: a fixed text -> vector table.
///
/// Unknown text fails loudly so a test never silently embeds something it
/// did not stage.
struct TableProvider {
    table: HashMap<String, Vec<f32>>,
}

impl TableProvider {
    fn new(entries: &[(&str, [f32; 4])]) -> Arc<Self> {
        Arc::new(Self {
            table: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.to_vec()))
                .collect(),
        })
    }
}

impl EmbeddingProvider for TableProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::InvalidInput(format!("unstaged text: {:?}", text)))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

fn service_with(temp: &TempDir, entries: &[(&str, [f32; 4])]) -> KnowledgeService {
    let store = Arc::new(ItemStore::open(&temp.path().join("mnema.db")).unwrap());
    KnowledgeService::with_parts(TableProvider::new(entries), store, &Config::default())
}

#[test]
fn tag_embedding_present_iff_tags_nonempty() {
    let temp = TempDir::new().unwrap();
    let service = service_with(
        &temp,
        &[
            ("tagged body", [1.0, 0.0, 0.0, 0.0]),
            ("rust memory", [0.0, 1.0, 0.0, 0.0]),
            ("untagged body", [0.0, 0.0, 1.0, 0.0]),
        ],
    );

    let tagged = service
        .ingest(NewItem::note("Tagged", "tagged body").with_tags("rust, memory"))
        .unwrap();
    let untagged = service
        .ingest(NewItem::note("Untagged", "untagged body"))
        .unwrap();

    assert!(tagged.tags_embedding.is_some());
    assert!(untagged.tags_embedding.is_none());

    // The invariant must also hold on what was actually persisted
    let items = service.list().unwrap();
    for item in items {
        assert_eq!(item.tags_embedding.is_some(), !item.tags.is_empty());
    }
}

#[test]
fn duplicate_tags_are_preserved_verbatim() {
    let temp = TempDir::new().unwrap();
    let service = service_with(
        &temp,
        &[
            ("body", [1.0, 0.0, 0.0, 0.0]),
            // The consolidated embedding input repeats the tag too
            ("rust rust", [0.0, 1.0, 0.0, 0.0]),
        ],
    );

    let item = service
        .ingest(NewItem::note("Dup", "body").with_tags("rust, rust"))
        .unwrap();

    assert_eq!(item.tags, vec!["rust", "rust"]);

    let persisted = service.get(item.id).unwrap();
    assert_eq!(persisted.tags, vec!["rust", "rust"]);
}

#[test]
fn embedding_failure_aborts_without_partial_item() {
    let temp = TempDir::new().unwrap();
    // Content is staged but the tag concatenation is not, so the second
    // embed call fails after the first succeeded
    let service = service_with(&temp, &[("body", [1.0, 0.0, 0.0, 0.0])]);

    let result = service.ingest(NewItem::note("Half", "body").with_tags("rust"));

    assert!(matches!(
        result,
        Err(mnema::MnemaError::Ingest(IngestError::Embedding(_)))
    ));
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn ingested_items_survive_store_reopen() {
    let temp = TempDir::new().unwrap();
    let entries: &[(&str, [f32; 4])] = &[
        ("persistent body", [1.0, 0.0, 0.0, 0.0]),
        ("notes", [0.0, 1.0, 0.0, 0.0]),
    ];

    let id = {
        let service = service_with(&temp, entries);
        service
            .ingest(
                NewItem::note("Persistent", "persistent body")
                    .with_tags("notes")
                    .from_file("persistent.txt"),
            )
            .unwrap()
            .id
    };

    let service = service_with(&temp, entries);
    let item = service.get(id).unwrap();

    assert_eq!(item.title, "Persistent");
    assert_eq!(item.original_filename.as_deref(), Some("persistent.txt"));
    assert_eq!(item.tags, vec!["notes"]);
    assert_eq!(item.content_embedding, Some(vec![1.0, 0.0, 0.0, 0.0]));
    assert_eq!(item.tags_embedding, Some(vec![0.0, 1.0, 0.0, 0.0]));
}

#[test]
fn delete_removes_item_from_all_paths() {
    let temp = TempDir::new().unwrap();
    let service = service_with(
        &temp,
        &[
            ("short body", [1.0, 0.0, 0.0, 0.0]),
            ("rust", [0.0, 1.0, 0.0, 0.0]),
        ],
    );

    let item = service
        .ingest(NewItem::note("Gone", "short body").with_tags("rust"))
        .unwrap();

    service.delete(item.id).unwrap();

    assert!(service.get(item.id).is_err());
    assert!(service.list().unwrap().is_empty());
    assert!(service.tag_search("rust", 5).unwrap().is_empty());
}

#[test]
fn stats_reflect_ingested_items() {
    let temp = TempDir::new().unwrap();
    let service = service_with(
        &temp,
        &[
            ("a body", [1.0, 0.0, 0.0, 0.0]),
            ("b body", [0.0, 1.0, 0.0, 0.0]),
            ("paper", [0.0, 0.0, 1.0, 0.0]),
        ],
    );

    service.ingest(NewItem::note("A", "a body")).unwrap();
    service
        .ingest(
            NewItem::note("B", "b body")
                .with_tags("paper")
                .from_file("b.txt"),
        )
        .unwrap();

    let stats = service.stats().unwrap();
    assert_eq!(stats.item_count, 2);
    assert_eq!(stats.document_count, 1);
    assert_eq!(stats.embedded_count, 2);
    assert_eq!(stats.tagged_count, 1);
}
