#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use policydesk::app::{build_router, AppState};
use policydesk::config::AppConfig;
use policydesk::db::repository::{DocumentRepository, InMemoryDocumentRepository};
use policydesk::error::AppError;
use policydesk::excel::analysis::TemplateAnalysis;
use policydesk::llm::client::CompletionProvider;
use policydesk::rag::client::{RagService, RetrievedChunk};
use policydesk::seed::demo_documents;

pub const DEFAULT_REPLY: &str = "Stub answer.";

/// LLM double that replays queued outcomes and records every prompt.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, AppError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
    }
}

/// Retrieval double with a fixed health flag and result set.
#[derive(Default)]
pub struct StubRag {
    pub healthy: bool,
    pub chunks: Vec<RetrievedChunk>,
}

#[async_trait]
impl RagService for StubRag {
    async fn is_healthy(&self) -> bool {
        self.healthy
    }

    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, AppError> {
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

/// In-process application wired to the demo catalog and test doubles.
pub struct TestEnv {
    pub router: Router,
    pub repo: Arc<dyn DocumentRepository>,
}

impl TestEnv {
    /// Healthy-looking LLM, RAG offline.
    pub fn start() -> Self {
        Self::with_services(Some(Arc::new(ScriptedLlm::default())), Arc::new(StubRag::default()))
    }

    pub fn with_services(llm: Option<Arc<dyn CompletionProvider>>, rag: Arc<dyn RagService>) -> Self {
        let repo: Arc<dyn DocumentRepository> = Arc::new(InMemoryDocumentRepository::new(
            demo_documents().expect("demo catalog parses"),
        ));

        let state = AppState {
            repo: repo.clone(),
            llm,
            rag,
            analysis: Arc::new(TemplateAnalysis),
            config: Arc::new(AppConfig::default()),
        };

        Self {
            router: build_router(state),
            repo,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// A `TestServer` bound to a real local port, for HTTP clients.
    pub fn http_server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .http_transport()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }
}
