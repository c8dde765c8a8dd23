//! catalog-search library
//!
//! Hybrid keyword + vector search over an artifact catalog.
//!
//! # Modules
//!
//! - `core`: Catalog items and the SQLite store (also the keyword index)
//! - `search`: Embeddings, vector index, hybrid merge and reindexing
//! - `http`: axum routes for search, reindex and health
//! - `app`: Startup wiring shared by the server and the CLI

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod search;

// Re-exports for convenience
pub use app::SearchApp;
pub use config::{SearchConfig, VectorBackend};
pub use core::item::CatalogItem;
pub use core::store::{CatalogStore, KeywordIndex, SqliteCatalog};
pub use error::{EmbeddingError, Result, SearchError};
pub use search::{
    EmbeddingProvider, HybridSearchCoordinator, Provenance, ReindexPipeline, SearchHit,
    VectorIndex, VectorIndexStatus,
};
