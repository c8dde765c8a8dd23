//! Routes, handlers and the server loop

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::{AppState, Limits};
use crate::core::item::CatalogItem;
use crate::error::SearchError;
use crate::search::{SearchHit, VectorIndexStatus};

const SEARCH_FAILED: &str = "An error occurred during search";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search/vector", get(vector_search))
        .route("/search/text", get(text_search))
        .route("/search/hybrid", get(hybrid_search))
        .route("/search/reindex", post(reindex_all))
        .route("/search/reindex/{id}", post(reindex_one))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {}", bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("catalog search listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// ===== Request / response bodies =====

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
    threshold: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    success: bool,
    query: String,
    results: Vec<ResultEntry>,
    count: usize,
}

/// A hit plus the catalog fields of its item, when the item still exists
#[derive(Debug, Serialize)]
struct ResultEntry {
    #[serde(flatten)]
    hit: SearchHit,
    #[serde(flatten)]
    item: Option<CatalogItem>,
}

#[derive(Debug, Default, Deserialize)]
struct ReindexRequest {
    #[serde(default)]
    secret: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReindexResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    success: bool,
    status: &'static str,
    vector_index: VectorIndexStatus,
    indexed_items: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Error surfaced to clients; carries no internal detail
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// ===== Handlers =====

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let indexed_items = state
        .vector
        .stats()
        .map(|s| s.entry_count)
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to read vector index stats");
            0
        });

    Json(HealthResponse {
        success: true,
        status: "ok",
        vector_index: state.vector.status().clone(),
        indexed_items,
    })
}

async fn vector_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let (query, limit) = validate(&params, state.limits)?;
    let threshold = parse_threshold(params.threshold.as_deref())?;

    let hits = state
        .vector
        .query_with_threshold(&query, limit, threshold)
        .await
        .map_err(|e| {
            error!(error = %e, "vector search failed");
            ApiError::internal(SEARCH_FAILED)
        })?;

    Ok(respond(&state, query, hits).await)
}

async fn text_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let (query, limit) = validate(&params, state.limits)?;

    let hits = state.keyword.query(&query, limit).await.map_err(|e| {
        error!(error = %e, "text search failed");
        ApiError::internal(SEARCH_FAILED)
    })?;

    Ok(respond(&state, query, hits).await)
}

async fn hybrid_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let (query, limit) = validate(&params, state.limits)?;
    // count reports the truncated list, not the merged total before the limit
    let hits = state.hybrid.search(&query, limit).await;
    Ok(respond(&state, query, hits).await)
}

async fn reindex_all(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReindexResponse>, ApiError> {
    authorize(&state, &body)?;

    let count = state.pipeline.reindex_all().await.map_err(|e| {
        error!(error = %e, "reindex failed");
        ApiError::internal("Failed to reindex items")
    })?;

    Ok(Json(ReindexResponse {
        success: true,
        message: format!("Successfully indexed {} items", count),
    }))
}

async fn reindex_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ReindexResponse>, ApiError> {
    authorize(&state, &body)?;

    state.pipeline.reindex_one(&id).await.map_err(|e| match e {
        SearchError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Item not found"),
        other => {
            error!(item_id = %id, error = %other, "reindex failed");
            ApiError::internal("Failed to reindex item")
        }
    })?;

    Ok(Json(ReindexResponse {
        success: true,
        message: "Successfully indexed item".to_string(),
    }))
}

// ===== Helpers =====

fn validate(params: &SearchParams, limits: Limits) -> Result<(String, usize), ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter \"q\" is required"))?;

    let limit = match params.limit.as_deref().map(str::trim) {
        None | Some("") => limits.default_limit,
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            ApiError::bad_request("Query parameter \"limit\" must be a non-negative integer")
        })?,
    };

    Ok((query.to_string(), limit.min(limits.max_limit)))
}

fn parse_threshold(raw: Option<&str>) -> Result<Option<f32>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f32>()
            .ok()
            .filter(|t| t.is_finite())
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("Query parameter \"threshold\" must be a number")),
    }
}

fn authorize(state: &AppState, body: &[u8]) -> Result<(), ApiError> {
    let request: ReindexRequest = serde_json::from_slice(body).unwrap_or_default();
    if state.auth.verify(request.secret.as_deref()) {
        Ok(())
    } else {
        warn!("rejected reindex request with bad secret");
        Err(ApiError::unauthorized())
    }
}

async fn respond(state: &AppState, query: String, hits: Vec<SearchHit>) -> Json<SearchResponse> {
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        let item = match state.catalog.find_by_id(&hit.item_id).await {
            Ok(item) => item,
            Err(e) => {
                warn!(item_id = %hit.item_id, error = %e, "catalog lookup failed");
                None
            }
        };
        results.push(ResultEntry { hit, item });
    }

    let count = results.len();
    Json(SearchResponse {
        success: true,
        query,
        results,
        count,
    })
}
