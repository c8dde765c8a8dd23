//! Text embeddings
//!
//! `EmbeddingProvider` asks a remote model first and falls back to a
//! deterministic hashed bag-of-words when the remote path fails for any reason.
//!
//! Known limitation: remote and fallback vectors live in different spaces. An
//! index that mixes them still answers queries, but ranking quality degrades.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::remote::{Embedder, RemoteEmbedder};
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

/// Embedding dimension (all-MiniLM-L6-v2 compatible)
pub const EMBEDDING_DIM: usize = 384;

/// Produces fixed-dimension vectors and never fails
pub struct EmbeddingProvider {
    remote: Option<Arc<dyn Embedder>>,
    dimension: usize,
}

impl EmbeddingProvider {
    /// Fallback only; never touches the network
    pub fn offline(dimension: usize) -> Self {
        Self {
            remote: None,
            dimension,
        }
    }

    pub fn with_remote(remote: Arc<dyn Embedder>, dimension: usize) -> Self {
        Self {
            remote: Some(remote),
            dimension,
        }
    }

    /// Build from config. The HTTP client is constructed here, once.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        match config.remote_endpoint() {
            Some(endpoint) => {
                let remote = RemoteEmbedder::new(
                    endpoint,
                    config.api_key.as_deref(),
                    Duration::from_secs(config.timeout_secs.max(1)),
                )?;
                info!(endpoint = remote.endpoint(), "remote embedding enabled");
                Ok(Self::with_remote(Arc::new(remote), config.dimension))
            }
            None => Ok(Self::offline(config.dimension)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Embed `text`. Always returns exactly `dimension()` components.
    pub async fn generate(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            return vec![0.0; self.dimension];
        }

        if let Some(remote) = &self.remote {
            match remote.embed(text).await.and_then(|v| self.check_dimension(v)) {
                Ok(embedding) => return embedding,
                Err(e) => debug!(error = %e, "remote embedding failed, using offline fallback"),
            }
        }

        fallback_embed(text, self.dimension)
    }

    fn check_dimension(&self, embedding: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::Dimension {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }
}

/// Deterministic offline embedding
///
/// 1. Lowercase and split on whitespace
/// 2. Hash each token into a bucket in `[0, dimension)`
/// 3. Add `1 / token_count` to that bucket
/// 4. L2 normalize (skipped for the zero vector)
pub fn fallback_embed(text: &str, dimension: usize) -> Vec<f32> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    let mut buckets = vec![0.0f64; dimension];
    if tokens.is_empty() || dimension == 0 {
        return vec![0.0; dimension];
    }

    let weight = 1.0 / tokens.len() as f64;
    for token in &tokens {
        buckets[token_bucket(token, dimension)] += weight;
    }

    let norm: f64 = buckets.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        buckets.iter().map(|x| (*x / norm) as f32).collect()
    } else {
        buckets.iter().map(|x| *x as f32).collect()
    }
}

/// 31-multiplier rolling hash over UTF-16 code units, 32-bit wrapping
fn token_bucket(token: &str, dimension: usize) -> usize {
    let mut hash: i32 = 0;
    for unit in token.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    hash.unsigned_abs() as usize % dimension
}

/// Cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::{FailingEmbedder, FixedEmbedder};

    fn l2(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_fallback_deterministic() {
        let a = fallback_embed("Emerald Pendant on silver chain", EMBEDDING_DIM);
        let b = fallback_embed("Emerald Pendant on silver chain", EMBEDDING_DIM);
        let c = fallback_embed("Gold Ring", EMBEDDING_DIM);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_fallback_unit_norm() {
        for text in ["gold", "Gold Ring", "a b c d e f g", "한국어 테스트", "x x x"] {
            let v = fallback_embed(text, EMBEDDING_DIM);
            assert!((l2(&v) - 1.0).abs() < 1e-5, "norm for {:?}", text);
        }
    }

    #[test]
    fn test_fallback_empty_is_zero() {
        for text in ["", "   ", "\n\t "] {
            let v = fallback_embed(text, EMBEDDING_DIM);
            assert_eq!(v.len(), EMBEDDING_DIM);
            assert!(v.iter().all(|x| *x == 0.0));
        }
    }

    #[test]
    fn test_fallback_case_and_spacing_insensitive() {
        assert_eq!(
            fallback_embed("Gold  Ring", EMBEDDING_DIM),
            fallback_embed("gold ring", EMBEDDING_DIM)
        );
    }

    #[test]
    fn test_token_bucket_known_values() {
        // "a" hashes to 97; "ab" to 97 * 31 + 98 = 3105
        assert_eq!(token_bucket("a", 384), 97);
        assert_eq!(token_bucket("ab", 384), 3105 % 384);
        for token in ["gold", "emerald", "pendant-with-a-very-long-name-that-overflows"] {
            assert!(token_bucket(token, 384) < 384);
        }
    }

    #[test]
    fn test_shared_tokens_raise_similarity() {
        let query = fallback_embed("gold", EMBEDDING_DIM);
        let ring = fallback_embed("gold ring", EMBEDDING_DIM);
        let necklace = fallback_embed("silver necklace", EMBEDDING_DIM);
        assert!(cosine_similarity(&query, &ring) > cosine_similarity(&query, &necklace));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_provider_offline() {
        let provider = EmbeddingProvider::offline(EMBEDDING_DIM);
        assert!(!provider.has_remote());
        assert_eq!(
            provider.generate("Gold Ring").await,
            fallback_embed("Gold Ring", EMBEDDING_DIM)
        );
    }

    #[tokio::test]
    async fn test_provider_uses_remote() {
        let provider = EmbeddingProvider::with_remote(Arc::new(FixedEmbedder::new(vec![0.5; 8])), 8);
        assert_eq!(provider.generate("anything").await, vec![0.5; 8]);
    }

    #[tokio::test]
    async fn test_provider_falls_back_on_failure() {
        let provider = EmbeddingProvider::with_remote(Arc::new(FailingEmbedder), EMBEDDING_DIM);
        assert_eq!(
            provider.generate("Gold Ring").await,
            fallback_embed("Gold Ring", EMBEDDING_DIM)
        );
    }

    #[tokio::test]
    async fn test_provider_rejects_wrong_dimension() {
        let provider =
            EmbeddingProvider::with_remote(Arc::new(FixedEmbedder::new(vec![1.0; 3])), EMBEDDING_DIM);
        let v = provider.generate("Gold Ring").await;
        assert_eq!(v.len(), EMBEDDING_DIM);
        assert_eq!(v, fallback_embed("Gold Ring", EMBEDDING_DIM));
    }

    #[tokio::test]
    async fn test_provider_blank_text_skips_remote() {
        let provider = EmbeddingProvider::with_remote(Arc::new(FixedEmbedder::new(vec![1.0; 4])), 4);
        assert_eq!(provider.generate("  ").await, vec![0.0; 4]);
    }

    #[test]
    fn test_from_config_offline() {
        let config = EmbeddingConfig {
            offline: true,
            ..EmbeddingConfig::default()
        };
        let provider = EmbeddingProvider::from_config(&config).unwrap();
        assert!(!provider.has_remote());
        assert_eq!(provider.dimension(), EMBEDDING_DIM);
    }
    #[test]
    fn test_from_config_remote() {
        let config = EmbeddingConfig {
            endpoint: Some("  http://127.0.0.1:9/embed ".to_string()),
            ..EmbeddingConfig::default()
        };
        let provider = EmbeddingProvider::from_config(&config).unwrap();
        assert!(provider.has_remote());
    }
}
