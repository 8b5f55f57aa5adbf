//! Client for the retrieval service that returns ranked document chunks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RagConfig;
use crate::error::AppError;

/// Metadata attached to each retrieved chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub title: String,
    pub date: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub level: String,
    pub business_group: String,
    pub region: String,
    pub risk_type: String,
    pub source_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub similarity_score: f64,
    pub chunk_index: usize,
    pub token_count: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RagService: Send + Sync {
    /// Whether the service answers its health endpoint.
    async fn is_healthy(&self) -> bool;

    /// The `top_k` chunks most similar to `query`.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, AppError>;
}

pub struct HttpRagService {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RetrievedChunk>,
}

impl HttpRagService {
    pub fn from_config(config: &RagConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl RagService for HttpRagService {
    async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("RAG health check failed: {e}");
                false
            }
        }
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, AppError> {
        let url = format!("{}/search", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&SearchRequest { query, top_k })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("RAG service unreachable: {e}")))?;

        if !resp.status().is_success() {
            warn!("RAG search returned HTTP {}", resp.status());
            return Err(AppError::Upstream(format!(
                "RAG search failed with HTTP {}",
                resp.status()
            )));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid RAG response: {e}")))?;
        Ok(parsed.results)
    }
}
