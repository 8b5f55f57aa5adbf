//! Hosted LLM client.
//!
//! Speaks the Gemini `generateContent` REST shape: one text prompt in, one
//! text answer out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::AppError;

/// Text generation seam used by the chat pipeline and the health probe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// Quota exhaustion is reported as [`AppError::QuotaExceeded`]; every
    /// other failure as [`AppError::Upstream`].
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// True when an error message indicates an exhausted quota.
pub fn is_quota_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("quota") || lower.contains("429")
}

pub struct HttpCompletionProvider {
    config: LlmConfig,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

impl HttpCompletionProvider {
    /// Build a client. Returns `None` when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, AppError> {
        if !config.is_configured() {
            return Ok(None);
        }
        let api_key = config.api_key.clone().unwrap_or_default();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Some(Self {
            config: config.clone(),
            api_key,
            client,
        }))
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        debug!(model = %self.config.model, chars = prompt.len(), "Calling LLM");

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("LLM connection failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = format!("HTTP {status}: {body}");
            if status == StatusCode::TOO_MANY_REQUESTS || is_quota_message(&body) {
                return Err(AppError::QuotaExceeded(message));
            }
            return Err(AppError::Upstream(message));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid LLM response: {e}")))?;

        Ok(parsed.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_detection() {
        assert!(is_quota_message("Resource has been exhausted (e.g. check quota)."));
        assert!(is_quota_message("HTTP 429 Too Many Requests"));
        assert!(!is_quota_message("invalid api key"));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_text(), "Hello world");
    }

    #[test]
    fn test_empty_candidates_give_empty_text() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.into_text(), "");
    }

    #[test]
    fn test_unconfigured_provider_is_none() {
        let provider = HttpCompletionProvider::from_config(&LlmConfig::default()).unwrap();
        assert!(provider.is_none());
    }

    #[test]
    fn test_url_shape() {
        let config = LlmConfig {
            endpoint: "http://llm.local/v1beta/".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let provider = HttpCompletionProvider::from_config(&config).unwrap().unwrap();
        assert_eq!(
            provider.url(),
            "http://llm.local/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
