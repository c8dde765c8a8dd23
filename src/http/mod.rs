//! HTTP API for catalog search

pub mod auth;
pub mod server;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::store::{CatalogStore, KeywordIndex};
use crate::search::{EmbeddingProvider, HybridSearchCoordinator, ReindexPipeline, VectorIndex};

pub use auth::AdminAuth;
pub use server::{router, serve};

/// Result size policy for the search routes
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl From<&ServerConfig> for Limits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

/// Services shared by every handler; each is built once at startup
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub keyword: Arc<dyn KeywordIndex>,
    pub vector: Arc<VectorIndex>,
    pub hybrid: Arc<HybridSearchCoordinator>,
    pub pipeline: Arc<ReindexPipeline>,
    pub auth: Arc<AdminAuth>,
    pub limits: Limits,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        keyword: Arc<dyn KeywordIndex>,
        vector: Arc<VectorIndex>,
        provider: Arc<EmbeddingProvider>,
        auth: AdminAuth,
        limits: Limits,
    ) -> Self {
        let hybrid = Arc::new(HybridSearchCoordinator::new(vector.clone(), keyword.clone()));
        let pipeline = Arc::new(ReindexPipeline::new(
            catalog.clone(),
            provider,
            vector.clone(),
        ));

        Self {
            catalog,
            keyword,
            vector,
            hybrid,
            pipeline,
            auth: Arc::new(auth),
            limits,
        }
    }
}
