//! Test doubles for the search subsystem

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::remote::Embedder;
use super::types::SearchHit;
use crate::core::item::CatalogItem;
use crate::core::store::KeywordIndex;
use crate::error::{EmbeddingError, Result, SearchError};

/// Remote that is always down
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Transport("connection refused".to_string()))
    }
}

/// Remote that returns the same vector for every input
pub struct FixedEmbedder {
    vector: Vec<f32>,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector.clone())
    }
}

/// Toy "semantic" model: words that share a concept share an axis.
///
/// Lets tests build items that are close in vector space while sharing no
/// literal terms.
pub struct ConceptEmbedder {
    axes: HashMap<String, usize>,
    dimension: usize,
}

impl ConceptEmbedder {
    pub fn new(dimension: usize, concepts: &[(&[&str], usize)]) -> Self {
        let mut axes = HashMap::new();
        for (words, axis) in concepts {
            for word in *words {
                axes.insert(word.to_lowercase(), *axis);
            }
        }
        Self { axes, dimension }
    }
}

#[async_trait]
impl Embedder for ConceptEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0.0f32; self.dimension];
        for word in text.to_lowercase().split_whitespace() {
            if let Some(&axis) = self.axes.get(word) {
                v[axis] += 1.0;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }
}

/// Keyword index with canned answers
#[derive(Default)]
pub struct StaticKeywordIndex {
    hits: Vec<SearchHit>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl StaticKeywordIndex {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl KeywordIndex for StaticKeywordIndex {
    async fn query(&self, _text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SearchError::InvalidInput("keyword backend down".to_string()));
        }
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}

/// The three-item catalog used across scenario tests
pub fn jewelry_items() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("1", "Emerald Pendant")
            .with_description("Green stone on a fine chain")
            .with_materials(["emerald", "silver"])
            .with_artisan("Ana"),
        CatalogItem::new("2", "Gold Ring")
            .with_description("Hammered band")
            .with_materials(["gold"])
            .with_artisan("Bo"),
        CatalogItem::new("3", "Silver Necklace")
            .with_description("Woven links")
            .with_materials(["silver"])
            .with_artisan("Cy"),
    ]
}
