use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::llm::client::CompletionProvider;

const PROBE_PROMPT: &str = "Hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub message: String,
    pub timestamp: String,
    pub llm_configured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probe the LLM with a one-word prompt. Always answers; failures are
/// reported in the body.
pub async fn check_health(llm: Option<&dyn CompletionProvider>) -> HealthResponse {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let Some(llm) = llm else {
        return HealthResponse {
            status: HealthStatus::Error,
            message: "LLM API key not configured".into(),
            timestamp,
            llm_configured: false,
            error: Some(
                "Set llm.api_key in the config file or POLICYDESK__LLM__API_KEY in the environment."
                    .into(),
            ),
        };
    };

    match llm.generate(PROBE_PROMPT).await {
        Ok(_) => HealthResponse {
            status: HealthStatus::Healthy,
            message: "All systems operational".into(),
            timestamp,
            llm_configured: true,
            error: None,
        },
        Err(AppError::QuotaExceeded(_)) => HealthResponse {
            status: HealthStatus::Error,
            message: "API quota exceeded - Using mock mode".into(),
            timestamp,
            llm_configured: true,
            error: Some("LLM API quota exceeded. The application will use mock responses until quota resets. You can still test all features with simulated AI responses.".into()),
        },
        Err(e) => {
            tracing::warn!("LLM health probe failed: {e}");
            HealthResponse {
                status: HealthStatus::Error,
                message: "LLM API connection failed".into(),
                timestamp,
                llm_configured: true,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Axum handler for `GET /api/health`.
pub async fn health_handler(
    State(state): State<crate::app::AppState>,
) -> axum::Json<HealthResponse> {
    axum::Json(check_health(state.llm.as_deref()).await)
}
