//! Startup sequence shared by the server and the local CLI commands

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::core::store::SqliteCatalog;
use crate::http::{AdminAuth, AppState, Limits};
use crate::search::{EmbeddingProvider, VectorIndex};

/// Fully wired services, ready to serve
pub struct SearchApp {
    pub catalog: Arc<SqliteCatalog>,
    pub state: AppState,
}

impl SearchApp {
    /// Open the catalog named in `config` and wire everything on top of it
    pub async fn start(config: &SearchConfig) -> Result<Self> {
        let catalog = Self::open_catalog(config)?;
        Self::assemble(Arc::new(catalog), config).await
    }

    /// Open (creating if needed) the catalog database
    pub fn open_catalog(config: &SearchConfig) -> Result<SqliteCatalog> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }

        SqliteCatalog::open(&config.database_path).with_context(|| {
            format!("Failed to open catalog {}", config.database_path.display())
        })
    }

    /// Build the provider, initialize and hydrate the vector index, then the
    /// coordinator and pipeline. Completes before any request is accepted.
    pub async fn assemble(catalog: Arc<SqliteCatalog>, config: &SearchConfig) -> Result<Self> {
        let provider = Arc::new(
            EmbeddingProvider::from_config(&config.embedding)
                .context("Failed to build embedding client")?,
        );
        info!(
            remote = provider.has_remote(),
            dimension = provider.dimension(),
            "embedding provider ready"
        );

        let mut index = VectorIndex::new(&config.vector, provider.clone(), catalog.clone());
        index.initialize();
        let index = Arc::new(index);

        if let Err(e) = index.hydrate(catalog.as_ref()).await {
            warn!(error = %e, "vector index hydrate failed, index starts partial");
        }

        let auth = AdminAuth::new(config.admin_secret.clone());
        if !auth.is_configured() {
            warn!("no admin secret configured, reindex routes will reject every request");
        }

        let state = AppState::new(
            catalog.clone(),
            catalog.clone(),
            index,
            provider,
            auth,
            Limits::from(&config.server),
        );

        Ok(Self { catalog, state })
    }
}
