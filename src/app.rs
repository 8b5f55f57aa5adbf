use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::chat::{ask, document_qa};
use crate::config::AppConfig;
use crate::db::repository::DocumentRepository;
use crate::excel::analysis::AnalysisProvider;
use crate::llm::client::CompletionProvider;
use crate::rag::client::RagService;

/// Shared application state available to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn DocumentRepository>,
    /// `None` while no LLM API key is configured.
    pub llm: Option<Arc<dyn CompletionProvider>>,
    pub rag: Arc<dyn RagService>,
    pub analysis: Arc<dyn AnalysisProvider>,
    pub config: Arc<AppConfig>,
}

/// All API routes with tracing, permissive CORS and the multipart body limit.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_request_bytes;

    Router::new()
        .route("/api/health", get(api::health::health_handler))
        .route("/api/ask", post(ask::ask_handler))
        .route("/api/ask/suggestions", post(api::documents::suggestions_handler))
        .route("/api/documents", get(api::documents::list_documents_handler))
        .route("/api/documents/query", post(api::documents::query_documents_handler))
        .route("/api/documents/filters", get(api::documents::filter_options_handler))
        .route("/api/documents/upload", post(api::upload::upload_documents_handler))
        .route("/api/documents/chat", post(document_qa::document_chat_handler))
        .route("/api/documents/{id}", get(api::documents::get_document_handler))
        .route(
            "/api/documents/{id}/bookmark",
            post(api::documents::toggle_bookmark_handler),
        )
        .route("/api/excel/parse", post(api::upload::parse_workbook_handler))
        .route("/api/excel/analyze", post(api::excel::analyze_workbook_handler))
        .route("/api/excel/download", get(api::excel::download_sample_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
