//! Serve command - start the HTTP API

use anyhow::Result;
use tracing::info;

use catalog_search::config::SearchConfig;
use catalog_search::{http, SearchApp};

/// Startup is explicit: the index is initialized and hydrated before binding
pub async fn run(config: SearchConfig, bind: Option<String>) -> Result<()> {
    let app = SearchApp::start(&config).await?;

    info!(
        items = app.catalog.count()?,
        vector_index = ?app.state.vector.status(),
        "catalog search starting"
    );

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    http::serve(app.state, &bind).await
}
