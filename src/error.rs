use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An external collaborator (LLM, RAG service) failed or answered badly.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The LLM provider rejected the call because a usage quota ran out.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
