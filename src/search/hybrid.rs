//! Hybrid search - keyword and vector matches merged into one list
//!
//! Both sub-queries run concurrently and always run to completion. A failing
//! sub-query counts as empty. Keyword hits go first; a vector hit for an item
//! already seen is dropped, not blended. Truncation happens after the merge.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use super::index::VectorIndex;
use super::types::{Provenance, SearchHit};
use crate::core::store::KeywordIndex;

pub struct HybridSearchCoordinator {
    vector: Arc<VectorIndex>,
    keyword: Arc<dyn KeywordIndex>,
}

impl HybridSearchCoordinator {
    pub fn new(vector: Arc<VectorIndex>, keyword: Arc<dyn KeywordIndex>) -> Self {
        Self { vector, keyword }
    }

    /// At most `limit` hits, no duplicate item ids. Never fails.
    pub async fn search(&self, text: &str, limit: usize) -> Vec<SearchHit> {
        let (vector, keyword) = tokio::join!(
            self.vector.query(text, limit),
            self.keyword.query(text, limit)
        );

        let vector = vector.unwrap_or_else(|e| {
            warn!(error = %e, "vector sub-query failed, treating as empty");
            Vec::new()
        });
        let keyword = keyword.unwrap_or_else(|e| {
            warn!(error = %e, "keyword sub-query failed, treating as empty");
            Vec::new()
        });

        merge(keyword, vector, limit)
    }
}

/// Keyword hits first (tagged text), then unseen vector hits (tagged vector)
pub fn merge(keyword: Vec<SearchHit>, vector: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(keyword.len() + vector.len());

    for hit in keyword {
        if seen.insert(hit.item_id.clone()) {
            merged.push(hit.relabel(Provenance::Text));
        }
    }

    for hit in vector {
        if seen.insert(hit.item_id.clone()) {
            merged.push(hit.relabel(Provenance::Vector));
        }
    }

    merged.truncate(limit);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VectorBackend, VectorConfig};
    use crate::core::store::SqliteCatalog;
    use crate::search::embedding::EmbeddingProvider;
    use crate::search::testing::{jewelry_items, ConceptEmbedder, StaticKeywordIndex};
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    const DIM: usize = 8;

    fn vector_index(
        backend: VectorBackend,
        provider: EmbeddingProvider,
        keyword: Arc<dyn KeywordIndex>,
    ) -> VectorIndex {
        let config = VectorConfig {
            backend,
            path: PathBuf::new(),
        };
        let mut index = VectorIndex::new(&config, Arc::new(provider), keyword);
        index.initialize();
        index
    }

    #[test]
    fn test_merge_text_wins_on_overlap() {
        let keyword = vec![SearchHit::text("a", 3.0), SearchHit::text("b", 1.0)];
        let vector = vec![SearchHit::vector("b", 0.99), SearchHit::vector("c", 0.5)];

        let merged = merge(keyword, vector, 10);
        assert_eq!(
            merged,
            vec![
                SearchHit::text("a", 3.0),
                SearchHit::text("b", 1.0),
                SearchHit::vector("c", 0.5),
            ]
        );
    }

    #[test]
    fn test_merge_truncates_after_dedup() {
        let keyword = vec![SearchHit::text("a", 2.0)];
        let vector = vec![
            SearchHit::vector("a", 0.9),
            SearchHit::vector("b", 0.8),
            SearchHit::vector("c", 0.7),
        ];

        let merged = merge(keyword, vector, 2);
        let ids: Vec<&str> = merged.iter().map(|h| h.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(merge(vec![SearchHit::text("a", 1.0)], vec![], 0).is_empty());
    }

    #[test]
    fn test_merge_no_duplicates_within_source() {
        let vector = vec![SearchHit::vector("x", 0.9), SearchHit::vector("x", 0.8)];
        assert_eq!(merge(vec![], vector, 5), vec![SearchHit::vector("x", 0.9)]);
    }

    #[tokio::test]
    async fn test_keyword_failure_is_isolated() {
        let vector_keyword = Arc::new(StaticKeywordIndex::new(vec![SearchHit::text("v", 1.0)]));
        let index = vector_index(
            VectorBackend::Disabled,
            EmbeddingProvider::offline(DIM),
            vector_keyword,
        );
        let failing = Arc::new(StaticKeywordIndex::failing());
        let coordinator = HybridSearchCoordinator::new(Arc::new(index), failing.clone());

        let hits = coordinator.search("anything", 5).await;
        assert_eq!(hits, vec![SearchHit::vector("v", 1.0)]);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_failures_yield_empty() {
        let index = vector_index(
            VectorBackend::Disabled,
            EmbeddingProvider::offline(DIM),
            Arc::new(StaticKeywordIndex::failing()),
        );
        let coordinator =
            HybridSearchCoordinator::new(Arc::new(index), Arc::new(StaticKeywordIndex::failing()));
        assert!(coordinator.search("anything", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_match_beats_semantic_neighbour() {
        // "gilded band" shares no words with "gold" but sits on the same concept axis
        let embedder = ConceptEmbedder::new(
            DIM,
            &[
                (&["gold", "gilded", "golden"], 0),
                (&["ring", "band"], 1),
                (&["silver", "necklace", "chain"], 2),
                (&["emerald", "pendant"], 3),
            ],
        );
        let provider = EmbeddingProvider::with_remote(Arc::new(embedder), DIM);

        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let mut items = jewelry_items();
        items.push(crate::core::item::CatalogItem::new("4", "Gilded Band"));
        for item in &items {
            catalog.upsert(item).unwrap();
        }

        let index = vector_index(VectorBackend::Memory, provider, catalog.clone());
        for item in &items {
            index.upsert(&item.id, &item.name).await.unwrap();
        }

        let nearest = index.query("gold", 2).await.unwrap();
        let ids: Vec<&str> = nearest.iter().map(|h| h.item_id.as_str()).collect();
        assert!(ids.contains(&"2") && ids.contains(&"4"));

        let coordinator = HybridSearchCoordinator::new(Arc::new(index), catalog.clone());

        let hits = coordinator.search("gold", 1).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item_id, "2");
        assert_eq!(hits[0].source, Provenance::Text);

        let hits = coordinator.search("gold", 5).await;
        assert_eq!(hits[0].item_id, "2");
        assert_eq!(hits[0].source, Provenance::Text);
        assert_eq!(hits.iter().filter(|h| h.item_id == "2").count(), 1);
        assert!(hits
            .iter()
            .any(|h| h.item_id == "4" && h.source == Provenance::Vector));
    }
}
