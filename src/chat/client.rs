//! HTTP client for a running portal, driving a [`ChatSession`].

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::api::health::HealthResponse;
use crate::chat::ask::{AskRequest, AskResponse};
use crate::chat::session::ChatSession;
use crate::error::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct PortalClient {
    base_url: String,
    client: Client,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid portal URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Portal URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// `POST /api/ask`. Any non-2xx answer is an error carrying the
    /// server's `error` message.
    pub async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AppError> {
        let url = format!("{}/api/ask", self.base_url);
        debug!(%url, "Sending question");

        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Portal unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(AppError::Upstream(message));
        }

        resp.json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid answer payload: {e}")))
    }

    /// `GET /api/health`.
    pub async fn health(&self) -> Result<HealthResponse, AppError> {
        let url = format!("{}/api/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Portal unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Upstream(format!("HTTP {}", resp.status())));
        }
        resp.json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid health payload: {e}")))
    }

    /// Submit the session's pending input and record the outcome.
    ///
    /// Returns `false` when there was nothing to send.
    pub async fn send(&self, session: &mut ChatSession, selected_titles: &[String]) -> bool {
        let Some(pending) = session.submit(selected_titles) else {
            return false;
        };
        let outcome = self.ask(&pending.request).await;
        session.complete(pending.seq, outcome)
    }
}
