//! Catalog persistence and the literal-text search it provides
//!
//! The catalog is the source of truth for items and their embeddings. The same
//! SQLite connection backs an FTS5 index that serves as the keyword matcher.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::item::CatalogItem;
use crate::error::{Result, SearchError};
use crate::search::types::SearchHit;
use crate::search::vectordb::{blob_to_embedding, embedding_to_blob};

lazy_static! {
    static ref TERM_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
}

/// CRUD surface the search subsystem needs from the catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<CatalogItem>>;
    async fn find_all(&self) -> Result<Vec<CatalogItem>>;
    /// Overwrite an existing item, embedding included
    async fn update(&self, item: &CatalogItem) -> Result<()>;
    /// Insert or replace an item
    async fn insert(&self, item: &CatalogItem) -> Result<()>;
}

/// Literal text matching over the catalog
#[async_trait]
pub trait KeywordIndex: Send + Sync {
    /// Best matches first, every hit tagged `Provenance::Text`
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// SQLite-backed catalog with an FTS5 keyword index
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open or create catalog at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let catalog = Self {
            conn: Mutex::new(conn),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Open in-memory catalog (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self {
            conn: Mutex::new(conn),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SearchError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<()> {
        self.lock()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                materials TEXT NOT NULL DEFAULT '[]',  -- JSON array
                artisan TEXT NOT NULL DEFAULT '',
                category TEXT,
                price REAL,
                image_url TEXT,
                embedding BLOB,
                updated_at INTEGER NOT NULL
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(
                name, description, materials, artisan,
                content = 'items',
                content_rowid = 'rowid',
                tokenize = 'porter unicode61'
            );

            -- Keep the FTS shadow in step with the text columns only
            CREATE TRIGGER IF NOT EXISTS items_ai AFTER INSERT ON items BEGIN
                INSERT INTO items_fts (rowid, name, description, materials, artisan)
                VALUES (new.rowid, new.name, new.description, new.materials, new.artisan);
            END;

            CREATE TRIGGER IF NOT EXISTS items_ad AFTER DELETE ON items BEGIN
                INSERT INTO items_fts (items_fts, rowid, name, description, materials, artisan)
                VALUES ('delete', old.rowid, old.name, old.description, old.materials, old.artisan);
            END;

            CREATE TRIGGER IF NOT EXISTS items_au
            AFTER UPDATE OF name, description, materials, artisan ON items BEGIN
                INSERT INTO items_fts (items_fts, rowid, name, description, materials, artisan)
                VALUES ('delete', old.rowid, old.name, old.description, old.materials, old.artisan);
                INSERT INTO items_fts (rowid, name, description, materials, artisan)
                VALUES (new.rowid, new.name, new.description, new.materials, new.artisan);
            END;
            "#,
        )?;

        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<CatalogItem>> {
        let conn = self.lock()?;
        let item = conn
            .query_row(
                "SELECT id, name, description, materials, artisan, category, price, image_url, embedding
                 FROM items WHERE id = ?1",
                params![id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn list(&self) -> Result<Vec<CatalogItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, materials, artisan, category, price, image_url, embedding
             FROM items ORDER BY id",
        )?;
        let rows = stmt.query_map([], item_from_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Insert or update by id. A record without an embedding keeps the stored one;
    /// only reindexing replaces it.
    pub fn upsert(&self, item: &CatalogItem) -> Result<()> {
        let materials = serde_json::to_string(&item.materials)?;
        let embedding = item.embedding.as_deref().map(embedding_to_blob);
        let now = chrono::Utc::now().timestamp();

        self.lock()?.execute(
            r#"
            INSERT INTO items (id, name, description, materials, artisan, category, price, image_url, embedding, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                materials = excluded.materials,
                artisan = excluded.artisan,
                category = excluded.category,
                price = excluded.price,
                image_url = excluded.image_url,
                embedding = COALESCE(excluded.embedding, items.embedding),
                updated_at = excluded.updated_at
            "#,
            params![
                item.id,
                item.name,
                item.description,
                materials,
                item.artisan,
                item.category,
                item.price,
                item.image_url,
                embedding,
                now,
            ],
        )?;

        Ok(())
    }

    /// Update an existing row; `NotFound` if the id is unknown
    pub fn replace(&self, item: &CatalogItem) -> Result<()> {
        let materials = serde_json::to_string(&item.materials)?;
        let embedding = item.embedding.as_deref().map(embedding_to_blob);
        let now = chrono::Utc::now().timestamp();

        let changed = self.lock()?.execute(
            r#"
            UPDATE items SET
                name = ?2, description = ?3, materials = ?4, artisan = ?5,
                category = ?6, price = ?7, image_url = ?8, embedding = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                item.id,
                item.name,
                item.description,
                materials,
                item.artisan,
                item.category,
                item.price,
                item.image_url,
                embedding,
                now,
            ],
        )?;

        if changed == 0 {
            return Err(SearchError::NotFound(item.id.clone()));
        }
        Ok(())
    }

    /// Ranked FTS5 lookup. Terms are OR-combined, score is `-bm25` (higher is better).
    pub fn text_search(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let match_expr = match fts_query(text) {
            Some(expr) if limit > 0 => expr,
            _ => return Ok(Vec::new()),
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT i.id, -bm25(items_fts) AS score
            FROM items_fts
            JOIN items i ON i.rowid = items_fts.rowid
            WHERE items_fts MATCH ?1
            ORDER BY score DESC, i.id ASC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![match_expr, limit as i64], |row| {
            let id: String = row.get(0)?;
            let score: f64 = row.get(1)?;
            Ok(SearchHit::text(id, score as f32))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn embedded_count(&self) -> Result<usize> {
        let n: i64 = self.lock()?.query_row(
            "SELECT COUNT(*) FROM items WHERE embedding IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn find_by_id(&self, id: &str) -> Result<Option<CatalogItem>> {
        self.get(id)
    }

    async fn find_all(&self) -> Result<Vec<CatalogItem>> {
        self.list()
    }

    async fn update(&self, item: &CatalogItem) -> Result<()> {
        self.replace(item)
    }

    async fn insert(&self, item: &CatalogItem) -> Result<()> {
        self.upsert(item)
    }
}

#[async_trait]
impl KeywordIndex for SqliteCatalog {
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.text_search(text, limit)
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogItem> {
    let materials_json: String = row.get(3)?;
    let materials: Vec<String> = serde_json::from_str(&materials_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let embedding_blob: Option<Vec<u8>> = row.get(8)?;

    Ok(CatalogItem {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        materials,
        artisan: row.get(4)?,
        category: row.get(5)?,
        price: row.get(6)?,
        image_url: row.get(7)?,
        embedding: embedding_blob.map(|b| blob_to_embedding(&b)),
    })
}

/// Build an FTS5 MATCH expression from free text.
///
/// Every word becomes a quoted term so user input can never hit FTS syntax.
fn fts_query(text: &str) -> Option<String> {
    let mut terms: Vec<String> = Vec::new();
    for m in TERM_RE.find_iter(text) {
        let term = m.as_str().to_lowercase();
        if !terms.contains(&term) {
            terms.push(term);
        }
    }

    if terms.is_empty() {
        return None;
    }

    Some(
        terms
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}
