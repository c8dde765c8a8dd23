//! Capability-gated vector index
//!
//! The backend comes from configuration and is opened once by `initialize`.
//! If it cannot be opened the index stays usable in `Disabled` status: queries
//! are answered by the keyword index and relabelled as vector hits, so callers
//! keep getting results. Only `status()` tells the two modes apart.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::embedding::EmbeddingProvider;
use super::types::{Provenance, SearchHit};
use super::vectordb::{IndexEntry, IndexStats, VectorStore, LAST_HYDRATE_KEY};
use crate::config::{VectorBackend, VectorConfig};
use crate::core::store::{CatalogStore, KeywordIndex};
use crate::error::{Result, SearchError};

/// Observable state of the vector engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum VectorIndexStatus {
    Ready { backend: VectorBackend },
    Disabled { reason: String },
}

pub struct VectorIndex {
    backend: VectorBackend,
    path: PathBuf,
    provider: Arc<EmbeddingProvider>,
    keyword: Arc<dyn KeywordIndex>,
    store: Option<VectorStore>,
    status: VectorIndexStatus,
}

impl VectorIndex {
    /// Not usable for native queries until `initialize` runs
    pub fn new(
        config: &VectorConfig,
        provider: Arc<EmbeddingProvider>,
        keyword: Arc<dyn KeywordIndex>,
    ) -> Self {
        Self {
            backend: config.backend,
            path: config.path.clone(),
            provider,
            keyword,
            store: None,
            status: VectorIndexStatus::Disabled {
                reason: "not initialized".to_string(),
            },
        }
    }

    /// Open the configured backend. Never fails: errors become `Disabled` status.
    pub fn initialize(&mut self) {
        let opened = match self.backend {
            VectorBackend::Disabled => Err(SearchError::VectorUnavailable(
                "disabled by configuration".to_string(),
            )),
            VectorBackend::Memory => VectorStore::open_in_memory(),
            VectorBackend::Sqlite => open_file_store(&self.path),
        };

        match opened {
            Ok(store) => {
                info!(backend = self.backend.as_str(), "vector index ready");
                self.store = Some(store);
                self.status = VectorIndexStatus::Ready {
                    backend: self.backend,
                };
            }
            Err(e) => {
                let reason = match e {
                    SearchError::VectorUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                warn!(
                    backend = self.backend.as_str(),
                    reason = %reason,
                    "vector index disabled, vector queries will use keyword search"
                );
                self.store = None;
                self.status = VectorIndexStatus::Disabled { reason };
            }
        }
    }

    pub fn status(&self) -> &VectorIndexStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, VectorIndexStatus::Ready { .. })
    }

    /// Embed `text` and store it under `item_id`, replacing any prior entry
    pub async fn upsert(&self, item_id: &str, text: &str) -> Result<()> {
        if self.store.is_none() {
            debug!(item_id, "vector index disabled, skipping upsert");
            return Ok(());
        }
        let embedding = self.provider.generate(text).await;
        self.upsert_embedding(item_id, embedding, text)
    }

    /// Store a precomputed embedding
    pub fn upsert_embedding(&self, item_id: &str, embedding: Vec<f32>, text: &str) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.upsert(&IndexEntry {
            item_id: item_id.to_string(),
            embedding,
            indexed_text: text.to_string(),
        })
    }

    /// Nearest items to `text`, best first
    pub async fn query(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.query_with_threshold(text, limit, None).await
    }

    /// As `query`, dropping hits scored below `threshold`
    pub async fn query_with_threshold(
        &self,
        text: &str,
        limit: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let hits = match &self.store {
            Some(store) => {
                let embedding = self.provider.generate(text).await;
                store
                    .search(&embedding, limit)?
                    .into_iter()
                    .map(|(id, score)| SearchHit::vector(id, score))
                    .collect::<Vec<_>>()
            }
            None => self
                .keyword
                .query(text, limit)
                .await?
                .into_iter()
                .map(|hit| hit.relabel(Provenance::Vector))
                .collect(),
        };

        Ok(match threshold {
            Some(min) => hits.into_iter().filter(|h| h.score >= min).collect(),
            None => hits,
        })
    }

    /// Load every catalog embedding into the index. The catalog's copy wins,
    /// including when it has none.
    pub async fn hydrate(&self, catalog: &dyn CatalogStore) -> Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let dimension = self.provider.dimension();
        let mut loaded = 0;
        for item in catalog.find_all().await? {
            let text = item.search_text();
            match item.embedding {
                Some(embedding) if embedding.len() == dimension => {
                    store.upsert(&IndexEntry {
                        item_id: item.id,
                        embedding,
                        indexed_text: text,
                    })?;
                    loaded += 1;
                }
                Some(embedding) => warn!(
                    item_id = %item.id,
                    expected = dimension,
                    actual = embedding.len(),
                    "skipping stored embedding with wrong dimension"
                ),
                // no embedding on the catalog side: drop whatever the index still holds
                None => store.delete(&item.id)?,
            }
        }

        store.set_meta(LAST_HYDRATE_KEY, &chrono::Utc::now().timestamp().to_string())?;
        info!(loaded, "vector index hydrated from catalog");
        Ok(loaded)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        match &self.store {
            Some(store) => store.get_stats(),
            None => Ok(IndexStats::default()),
        }
    }
}

fn open_file_store(path: &Path) -> Result<VectorStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(SearchError::VectorUnavailable(format!(
                "directory {} does not exist",
                parent.display()
            )));
        }
    }
    VectorStore::open(path)
}
