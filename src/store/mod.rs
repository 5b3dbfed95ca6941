//! SQLite-backed item store with migrations
//!
//! Holds knowledge items and their embedding vectors. Exposes the two read
//! primitives the search engine relies on: a full scan in stable id order,
//! and an ordered nearest-neighbor query over the tag-embedding column.

use chrono::{DateTime, TimeZone, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use thiserror::Error;

use crate::embedding::vector::{cosine_distance, from_blob, to_blob};
use crate::item::KnowledgeItem;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("Corrupted row {id}: {message}")]
    Corrupted { id: i64, message: String },
}

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Values persisted for a new item; embeddings are already generated
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub title: String,
    pub text_content: String,
    pub original_filename: Option<String>,
    pub tags: Vec<String>,
    pub content_embedding: Option<Vec<f32>>,
    pub tags_embedding: Option<Vec<f32>>,
}

/// Item store over a pooled SQLite database
pub struct ItemStore {
    pool: DbPool,
}

impl ItemStore {
    /// Open (and migrate) the store at the given path
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path);

        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        {
            let conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;

            // WAL keeps concurrent readers off the writer's lock
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
        }

        let store = Self { pool };
        store.migrate()?;

        Ok(store)
    }

    /// Open an in-memory store (tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, StoreError> {
        self.pool.get().map_err(|e| StoreError::Pool(e.to_string()))
    }

    /// Run database migrations
    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;

                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Insert a new item, returning it with the assigned id and timestamps
    pub fn insert(&self, record: ItemRecord) -> Result<KnowledgeItem, StoreError> {
        let conn = self.get_conn()?;
        let now = Utc::now();

        let tags_json = serde_json::to_string(&record.tags).map_err(|e| StoreError::Corrupted {
            id: 0,
            message: format!("Failed to encode tags: {}", e),
        })?;

        conn.execute(
            "INSERT INTO items
                (title, text_content, original_filename, tags,
                 content_embedding, tags_embedding, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                record.title,
                record.text_content,
                record.original_filename,
                tags_json,
                record.content_embedding.as_deref().map(to_blob),
                record.tags_embedding.as_deref().map(to_blob),
                now.timestamp(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        let created_at = Utc
            .timestamp_opt(now.timestamp(), 0)
            .single()
            .unwrap_or(now);

        Ok(KnowledgeItem {
            id,
            title: record.title,
            text_content: record.text_content,
            original_filename: record.original_filename,
            tags: record.tags,
            content_embedding: record.content_embedding,
            tags_embedding: record.tags_embedding,
            created_at,
            updated_at: created_at,
        })
    }

    /// Fetch a single item by id
    pub fn get(&self, id: i64) -> Result<Option<KnowledgeItem>, StoreError> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_ITEM))?;

        let mut rows = stmt.query_map(params![id], raw_row)?;
        match rows.next() {
            Some(raw) => Ok(Some(raw?.into_item())),
            None => Ok(None),
        }
    }

    /// Full scan of all items in stable id order
    pub fn scan_all(&self) -> Result<Vec<KnowledgeItem>, StoreError> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_ITEM))?;

        let rows = stmt.query_map([], raw_row)?;
        let mut items = Vec::new();
        for raw in rows {
            items.push(raw?.into_item());
        }
        Ok(items)
    }

    /// Delete an item. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Nearest neighbors over the tag-embedding column
    ///
    /// Rows without a tag embedding are excluded by the query itself. Each
    /// surviving row is reconstructed into a full item and ordered by
    /// ascending cosine distance to the query vector; ties keep id order.
    /// Vectors whose length differs from the query are excluded and the
    /// condition reported, never coerced.
    pub fn nearest_by_tags(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(KnowledgeItem, f32)>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE tags_embedding IS NOT NULL ORDER BY id",
            SELECT_ITEM
        ))?;

        let rows = stmt.query_map([], raw_row)?;

        let mut scored: Vec<(KnowledgeItem, f32)> = Vec::new();
        for raw in rows {
            let item = raw?.into_item();
            let embedding = match &item.tags_embedding {
                Some(v) => v,
                // Decode already warned; the row no longer qualifies
                None => continue,
            };

            if embedding.len() != query.len() {
                tracing::warn!(
                    item_id = item.id,
                    expected = query.len(),
                    actual = embedding.len(),
                    "Skipping item with mismatched tag-embedding dimension"
                );
                continue;
            }

            let distance = cosine_distance(query, embedding);
            scored.push((item, distance));
        }

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    /// Number of stored items
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Store statistics
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.get_conn()?;

        let item_count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;

        let document_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE original_filename IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let embedded_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE content_embedding IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let tagged_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE tags_embedding IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            item_count: item_count as usize,
            document_count: document_count as usize,
            embedded_count: embedded_count as usize,
            tagged_count: tagged_count as usize,
        })
    }
}

/// Store statistics
#[derive(Debug)]
pub struct StoreStats {
    pub item_count: usize,
    pub document_count: usize,
    /// Items with a content embedding present
    pub embedded_count: usize,
    /// Items with a tag embedding present
    pub tagged_count: usize,
}

const SELECT_ITEM: &str = "SELECT id, title, text_content, original_filename, tags, \
     content_embedding, tags_embedding, created_at, updated_at FROM items";

/// Raw column values before typed conversion
struct RawItemRow {
    id: i64,
    title: String,
    text_content: String,
    original_filename: Option<String>,
    tags_json: String,
    content_embedding: Option<Vec<u8>>,
    tags_embedding: Option<Vec<u8>>,
    created_at: i64,
    updated_at: i64,
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItemRow> {
    Ok(RawItemRow {
        id: row.get(0)?,
        title: row.get(1)?,
        text_content: row.get(2)?,
        original_filename: row.get(3)?,
        tags_json: row.get(4)?,
        content_embedding: row.get(5)?,
        tags_embedding: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl RawItemRow {
    /// Typed row-to-entity mapping shared by every read path
    fn into_item(self) -> KnowledgeItem {
        let tags: Vec<String> = serde_json::from_str(&self.tags_json).unwrap_or_else(|e| {
            tracing::warn!(item_id = self.id, "Unreadable tags column: {}", e);
            Vec::new()
        });

        let content_embedding = self.content_embedding.as_deref().and_then(|bytes| {
            let decoded = from_blob(bytes);
            if decoded.is_none() {
                tracing::warn!(item_id = self.id, "Corrupted content embedding, treating as absent");
            }
            decoded
        });

        let tags_embedding = self.tags_embedding.as_deref().and_then(|bytes| {
            let decoded = from_blob(bytes);
            if decoded.is_none() {
                tracing::warn!(item_id = self.id, "Corrupted tag embedding, treating as absent");
            }
            decoded
        });

        KnowledgeItem {
            id: self.id,
            title: self.title,
            text_content: self.text_content,
            original_filename: self.original_filename,
            tags,
            content_embedding,
            tags_embedding,
            created_at: timestamp(self.created_at),
            updated_at: timestamp(self.updated_at),
        }
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        text_content TEXT NOT NULL,
        original_filename TEXT,
        tags TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
        content_embedding BLOB,           -- little-endian f32
        tags_embedding BLOB,              -- little-endian f32; NULL iff tags empty
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE INDEX idx_items_created_at ON items(created_at);
    CREATE INDEX idx_items_filename ON items(original_filename);
    "#,
];
