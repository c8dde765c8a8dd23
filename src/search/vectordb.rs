//! Native vector engine using SQLite
//!
//! Stores index entries as BLOBs and computes cosine similarity in Rust.
//! Entries are a cache of catalog embeddings; the catalog wins on conflict.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::embedding::cosine_similarity;
use crate::error::{Result, SearchError};

/// Vector store for item embeddings
pub struct VectorStore {
    conn: Mutex<Connection>,
}

/// One indexed item
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub item_id: String,
    pub embedding: Vec<f32>,
    pub indexed_text: String,
}

impl VectorStore {
    /// Open or create store at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SearchError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<()> {
        self.lock()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS index_entries (
                item_id TEXT PRIMARY KEY,
                embedding BLOB NOT NULL,
                indexed_text TEXT NOT NULL,
                indexed_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_entries_indexed_at ON index_entries(indexed_at);
            "#,
        )?;

        Ok(())
    }

    /// Insert or overwrite the entry for `entry.item_id`
    pub fn upsert(&self, entry: &IndexEntry) -> Result<()> {
        let blob = embedding_to_blob(&entry.embedding);
        let now = chrono::Utc::now().timestamp();

        self.lock()?.execute(
            r#"
            INSERT INTO index_entries (item_id, embedding, indexed_text, indexed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(item_id) DO UPDATE SET
                embedding = excluded.embedding,
                indexed_text = excluded.indexed_text,
                indexed_at = excluded.indexed_at
            "#,
            params![entry.item_id, blob, entry.indexed_text, now],
        )?;

        Ok(())
    }

    pub fn delete(&self, item_id: &str) -> Result<()> {
        self.lock()?
            .execute("DELETE FROM index_entries WHERE item_id = ?1", params![item_id])?;
        Ok(())
    }

    /// Nearest entries to `query_embedding` by cosine similarity, best first
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<(String, f32)>> {
        // O(n) scan; fine for a single-node catalog
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT item_id, embedding FROM index_entries")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((id, blob))
        })?;

        let mut results: Vec<(String, f32)> = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            let embedding = blob_to_embedding(&blob);
            results.push((id, cosine_similarity(query_embedding, &embedding)));
        }

        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        results.truncate(limit);

        Ok(results)
    }

    pub fn get_stats(&self) -> Result<IndexStats> {
        let conn = self.lock()?;
        let entry_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM index_entries", [], |row| row.get(0))?;
        let last_indexed: Option<i64> = conn
            .query_row("SELECT MAX(indexed_at) FROM index_entries", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        drop(conn);
        let last_hydrate = self
            .get_meta(LAST_HYDRATE_KEY)?
            .and_then(|v| v.parse().ok());

        Ok(IndexStats {
            entry_count: entry_count as usize,
            last_indexed,
            last_hydrate,
        })
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .lock()?
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

pub(crate) const LAST_HYDRATE_KEY: &str = "last_hydrate";

/// Index statistics
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub entry_count: usize,
    /// Unix seconds of the most recent upsert
    pub last_indexed: Option<i64>,
    /// Unix seconds of the last load from the catalog
    pub last_hydrate: Option<i64>,
}

/// Convert f32 embedding to BLOB
pub(crate) fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert BLOB to f32 embedding
pub(crate) fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            item_id: id.to_string(),
            embedding,
            indexed_text: format!("text for {}", id),
        }
    }

    #[test]
    fn test_blob_conversion() {
        let embedding = vec![1.0, 2.0, 3.0, -0.5];
        let blob = embedding_to_blob(&embedding);
        assert_eq!(blob.len(), 16);
        assert_eq!(blob_to_embedding(&blob), embedding);
    }

    #[test]
    fn test_empty_store_search() -> Result<()> {
        let store = VectorStore::open_in_memory()?;
        assert!(store.search(&[1.0, 0.0], 5)?.is_empty());
        assert_eq!(store.get_stats()?.entry_count, 0);
        assert!(store.get_stats()?.last_indexed.is_none());
        Ok(())
    }

    #[test]
    fn test_search_orders_by_similarity() -> Result<()> {
        let store = VectorStore::open_in_memory()?;
        store.upsert(&entry("a", vec![1.0, 0.0, 0.0]))?;
        store.upsert(&entry("b", vec![0.7, 0.7, 0.0]))?;
        store.upsert(&entry("c", vec![0.0, 0.0, 1.0]))?;

        let results = store.search(&[1.0, 0.1, 0.0], 2)?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "b");
        assert!(results[0].1 > results[1].1);
        Ok(())
    }

    #[test]
    fn test_upsert_overwrites() -> Result<()> {
        let store = VectorStore::open_in_memory()?;
        store.upsert(&entry("a", vec![1.0, 0.0]))?;
        store.upsert(&entry("a", vec![0.0, 1.0]))?;

        let stats = store.get_stats()?;
        assert_eq!(stats.entry_count, 1);
        assert!(stats.last_indexed.is_some());
        assert_eq!(store.search(&[0.0, 1.0], 1)?, vec![("a".to_string(), 1.0)]);

        store.delete("a")?;
        store.delete("a")?;
        assert_eq!(store.get_stats()?.entry_count, 0);
        Ok(())
    }

    #[test]
    fn test_meta() -> Result<()> {
        let store = VectorStore::open_in_memory()?;
        assert!(store.get_meta("last_hydrate")?.is_none());
        store.set_meta("last_hydrate", "1")?;
        store.set_meta("last_hydrate", "2")?;
        assert_eq!(store.get_meta("last_hydrate")?.as_deref(), Some("2"));
        assert_eq!(store.get_stats()?.last_hydrate, Some(2));
        Ok(())
    }

    #[test]
    fn test_open_file_backed() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");
        {
            let store = VectorStore::open(&path)?;
            store.upsert(&entry("x", vec![0.5, 0.5]))?;
        }
        let reopened = VectorStore::open(&path)?;
        assert_eq!(reopened.get_stats()?.entry_count, 1);
        Ok(())
    }
}
