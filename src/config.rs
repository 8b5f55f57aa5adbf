//! Runtime configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `POLICYDESK__*` environment variables (e.g. `POLICYDESK__LLM__API_KEY`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (default: 127.0.0.1:3000)
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// Hosted LLM settings. The client is disabled while `api_key` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generateContent API
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_llm_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_rag_url")]
    pub url: String,
    #[serde(default = "default_rag_timeout")]
    pub timeout_secs: u64,
}

fn default_rag_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_rag_timeout() -> u64 {
    10
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            url: default_rag_url(),
            timeout_secs: default_rag_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// JSON catalog to load instead of the embedded demo documents
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Per-file limit checked by the document upload
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
    /// Whole-body limit for multipart requests
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    /// Upper bound on the dense cell grid built from a parsed workbook
    #[serde(default = "default_max_cells")]
    pub max_cells: usize,
}

fn default_max_file_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_max_request_bytes() -> usize {
    200 * 1024 * 1024
}

fn default_max_cells() -> usize {
    1_000_000
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_request_bytes: default_max_request_bytes(),
            max_cells: default_max_cells(),
        }
    }
}

impl AppConfig {
    /// Layer the optional file and the environment over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder = builder.add_source(config::File::with_name("policydesk").required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("POLICYDESK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        Ok(config)
    }
}
