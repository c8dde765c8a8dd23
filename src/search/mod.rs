//! Hybrid search subsystem
//!
//! - `embedding`: remote-first embeddings with a deterministic offline fallback
//! - `vectordb`: SQLite store of item embeddings
//! - `index`: vector index that degrades to keyword search when its engine is down
//! - `hybrid`: keyword + vector merge with text-first tie-break
//! - `reindex`: batch and single-item re-embedding

pub mod embedding;
pub mod hybrid;
pub mod index;
pub mod reindex;
pub mod remote;
pub mod types;
pub mod vectordb;

#[cfg(test)]
pub(crate) mod testing;

pub use embedding::{fallback_embed, EmbeddingProvider, EMBEDDING_DIM};
pub use hybrid::HybridSearchCoordinator;
pub use index::{VectorIndex, VectorIndexStatus};
pub use reindex::ReindexPipeline;
pub use remote::{Embedder, RemoteEmbedder};
pub use types::{Provenance, SearchHit};
pub use vectordb::{IndexEntry, IndexStats, VectorStore};
