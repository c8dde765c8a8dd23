//! Reindex pipeline - recompute item embeddings and write them back
//!
//! Embeddings live on the catalog item. The vector index is refreshed from the
//! same vector after the catalog write succeeds.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::embedding::EmbeddingProvider;
use super::index::VectorIndex;
use crate::core::item::CatalogItem;
use crate::core::store::CatalogStore;
use crate::error::{Result, SearchError};

pub struct ReindexPipeline {
    catalog: Arc<dyn CatalogStore>,
    provider: Arc<EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl ReindexPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        provider: Arc<EmbeddingProvider>,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            catalog,
            provider,
            index,
        }
    }

    /// Re-embed a single item by id
    pub async fn reindex_one(&self, item_id: &str) -> Result<()> {
        let item = self
            .catalog
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| SearchError::NotFound(item_id.to_string()))?;
        self.reindex_item(item).await
    }

    /// Re-embed every item, one at a time.
    ///
    /// Sequential on purpose: it bounds load on the remote embedding API. The
    /// first failure aborts the run; items already written stay written.
    pub async fn reindex_all(&self) -> Result<usize> {
        let start = Instant::now();
        let items = self.catalog.find_all().await?;
        info!(total = items.len(), "reindexing catalog");

        let mut processed = 0;
        for item in items {
            let item_id = item.id.clone();
            if let Err(e) = self.reindex_item(item).await {
                error!(item_id = %item_id, processed, error = %e, "reindex aborted");
                return Err(e);
            }
            processed += 1;
            debug!(item_id = %item_id, processed, "item reindexed");
        }

        info!(
            processed,
            duration_ms = start.elapsed().as_millis() as u64,
            "reindex complete"
        );
        Ok(processed)
    }

    async fn reindex_item(&self, mut item: CatalogItem) -> Result<()> {
        let text = item.search_text();
        let embedding = self.provider.generate(&text).await;

        item.embedding = Some(embedding.clone());
        self.catalog.update(&item).await?;

        // catalog is authoritative; a stale index entry heals on the next hydrate
        if let Err(e) = self.index.upsert_embedding(&item.id, embedding, &text) {
            warn!(item_id = %item.id, error = %e, "vector index refresh failed");
        }
        Ok(())
    }
}
