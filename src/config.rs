//! Service configuration
//!
//! Loaded once at startup from an optional YAML file, then overridden from the
//! environment. The vector backend is chosen here and nowhere else.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::search::embedding::EMBEDDING_DIM;

/// Default remote model: sentence-transformers all-MiniLM-L6-v2 (384 dimensions)
pub const DEFAULT_EMBEDDING_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/sentence-transformers/all-MiniLM-L6-v2";

pub const ENV_ADMIN_SECRET: &str = "CATALOG_SEARCH_ADMIN_SECRET";
pub const ENV_EMBEDDING_API_KEY: &str = "CATALOG_SEARCH_EMBEDDING_API_KEY";
pub const ENV_EMBEDDING_ENDPOINT: &str = "CATALOG_SEARCH_EMBEDDING_ENDPOINT";
pub const ENV_VECTOR_BACKEND: &str = "CATALOG_SEARCH_VECTOR_BACKEND";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Catalog SQLite file
    pub database_path: PathBuf,
    pub vector: VectorConfig,
    pub embedding: EmbeddingConfig,
    pub server: ServerConfig,
    /// Shared secret for the reindex routes. Unset means every reindex request is rejected.
    pub admin_secret: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/catalog.db"),
            vector: VectorConfig::default(),
            embedding: EmbeddingConfig::default(),
            server: ServerConfig::default(),
            admin_secret: None,
        }
    }
}

/// Which native vector engine to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// SQLite file at `vector.path`
    Sqlite,
    /// In-process, lost on restart
    Memory,
    /// No vector engine; queries are served by keyword delegation
    Disabled,
}

impl VectorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
            Self::Disabled => "disabled",
        }
    }
}

impl std::str::FromStr for VectorBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(format!(
                "unknown vector backend '{}' (must be: sqlite|memory|disabled)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub backend: VectorBackend,
    pub path: PathBuf,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Sqlite,
            path: PathBuf::from("data/vectors.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    /// Remote feature-extraction endpoint; `None` keeps everything offline
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Force the deterministic fallback even when an endpoint is set
    pub offline: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
            endpoint: Some(DEFAULT_EMBEDDING_ENDPOINT.to_string()),
            api_key: None,
            timeout_secs: 30,
            offline: false,
        }
    }
}

impl EmbeddingConfig {
    /// Endpoint to call, if the remote path is enabled at all
    pub fn remote_endpoint(&self) -> Option<&str> {
        if self.offline {
            return None;
        }
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl SearchConfig {
    /// Load from `path` if it exists, otherwise start from defaults; then apply env overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process env in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_ADMIN_SECRET) {
            self.admin_secret = Some(secret);
        }
        if let Some(key) = lookup(ENV_EMBEDDING_API_KEY) {
            self.embedding.api_key = Some(key);
        }
        if let Some(endpoint) = lookup(ENV_EMBEDDING_ENDPOINT) {
            self.embedding.endpoint = Some(endpoint);
        }
        if let Some(backend) = lookup(ENV_VECTOR_BACKEND) {
            self.vector.backend = backend
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {}", ENV_VECTOR_BACKEND))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.embedding.dimension > 0, "embedding.dimension must be > 0");
        anyhow::ensure!(self.server.max_limit > 0, "server.max_limit must be > 0");
        anyhow::ensure!(
            self.server.default_limit <= self.server.max_limit,
            "server.default_limit ({}) exceeds server.max_limit ({})",
            self.server.default_limit,
            self.server.max_limit
        );
        Ok(())
    }
}
