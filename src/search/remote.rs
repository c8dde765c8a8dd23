//! Remote feature-extraction client (Hugging Face inference API compatible)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;

/// Anything that can turn text into a vector, possibly failing
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Async client for a hosted sentence-embedding model
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
}

impl RemoteEmbedder {
    /// Build the client once; `timeout` bounds every request
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(EmbeddingError::NotConfigured);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            let auth = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| EmbeddingError::Transport("invalid API key header".to_string()))?;
            headers.insert(AUTHORIZATION, auth);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&FeatureRequest { inputs: text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        parse_payload(&body)
    }
}

#[derive(Serialize)]
struct FeatureRequest<'a> {
    inputs: &'a str,
}

/// Single sentence: `[f32]`; some deployments wrap it: `[[f32]]`
#[derive(Deserialize)]
#[serde(untagged)]
enum FeaturePayload {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

fn parse_payload(body: &str) -> Result<Vec<f32>, EmbeddingError> {
    let payload: FeaturePayload =
        serde_json::from_str(body).map_err(|e| EmbeddingError::Payload(e.to_string()))?;

    let embedding = match payload {
        FeaturePayload::Flat(v) => v,
        FeaturePayload::Nested(rows) => rows
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Payload("empty embedding list".to_string()))?,
    };

    if embedding.is_empty() {
        return Err(EmbeddingError::Payload("empty embedding".to_string()));
    }
    Ok(embedding)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}
