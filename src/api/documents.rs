use std::collections::BTreeSet;

use axum::extract::{Path, State};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::repository::DocumentRepository;
use crate::error::AppError;
use crate::library::pagination::{Pagination, DEFAULT_PAGE_SIZE};
use crate::library::prompts::suggested_prompts;
use crate::library::store::{build_view, LibraryView};
use crate::models::document::Document;
use crate::models::filter::{
    FilterCriteria, DOCUMENT_TYPE_OPTIONS, LEVEL_OPTIONS, OWNING_BUSINESS_OPTIONS,
    PUBLICATION_DATE_OPTIONS,
};

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Body of `POST /api/documents/query`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    #[serde(flatten)]
    pub criteria: FilterCriteria,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Option lists for the filter sidebar. Fixed lists plus the distinct
/// values present in the catalog for the free-form facets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub publication_date: Vec<String>,
    pub document_type: Vec<String>,
    pub level: Vec<String>,
    pub owning_business_group: Vec<String>,
    pub region: Vec<String>,
    pub risk_type: Vec<String>,
    pub topic: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionRequest {
    #[serde(default)]
    pub selected_documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub prompts: Vec<String>,
}

pub async fn process_query(
    repo: &dyn DocumentRepository,
    query: DocumentQuery,
    today: NaiveDate,
) -> Result<LibraryView, AppError> {
    if query.page_size == 0 {
        return Err(AppError::BadRequest("pageSize must be greater than zero".into()));
    }

    let documents = repo.list_all().await?;
    let pagination = Pagination {
        current_page: query.page.max(1),
        page_size: query.page_size,
    };
    Ok(build_view(&documents, &query.criteria, pagination, 0, today))
}

fn owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| o.to_string()).collect()
}

pub async fn process_filter_options(repo: &dyn DocumentRepository) -> Result<FilterOptions, AppError> {
    let documents = repo.list_all().await?;
    let distinct = |pick: fn(&Document) -> Option<&String>| -> Vec<String> {
        documents
            .iter()
            .filter_map(pick)
            .filter(|v| !v.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };
    Ok(FilterOptions {
        publication_date: owned(PUBLICATION_DATE_OPTIONS),
        document_type: owned(DOCUMENT_TYPE_OPTIONS),
        level: owned(LEVEL_OPTIONS),
        owning_business_group: owned(OWNING_BUSINESS_OPTIONS),
        region: distinct(|d| d.region.as_ref()),
        risk_type: distinct(|d| d.risk_type.as_ref()),
        topic: distinct(|d| d.topic.as_ref()),
    })
}

pub async fn process_suggestions(
    repo: &dyn DocumentRepository,
    request: SuggestionRequest,
) -> Result<SuggestionResponse, AppError> {
    let selected = repo.find_many(&request.selected_documents).await?;
    let refs: Vec<&Document> = selected.iter().collect();
    Ok(SuggestionResponse {
        prompts: suggested_prompts(&refs),
    })
}

/// Axum handler for `GET /api/documents`.
pub async fn list_documents_handler(
    State(state): State<crate::app::AppState>,
) -> Result<axum::Json<Vec<Document>>, AppError> {
    Ok(axum::Json(state.repo.list_all().await?))
}

/// Axum handler for `POST /api/documents/query`.
pub async fn query_documents_handler(
    State(state): State<crate::app::AppState>,
    axum::Json(query): axum::Json<DocumentQuery>,
) -> Result<axum::Json<LibraryView>, AppError> {
    let view = process_query(state.repo.as_ref(), query, Local::now().date_naive()).await?;
    Ok(axum::Json(view))
}

/// Axum handler for `GET /api/documents/filters`.
pub async fn filter_options_handler(
    State(state): State<crate::app::AppState>,
) -> Result<axum::Json<FilterOptions>, AppError> {
    Ok(axum::Json(process_filter_options(state.repo.as_ref()).await?))
}

/// Axum handler for `GET /api/documents/{id}`.
pub async fn get_document_handler(
    State(state): State<crate::app::AppState>,
    Path(id): Path<String>,
) -> Result<axum::Json<Document>, AppError> {
    let document = state
        .repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document '{id}' not found")))?;
    Ok(axum::Json(document))
}

/// Axum handler for `POST /api/documents/{id}/bookmark`.
pub async fn toggle_bookmark_handler(
    State(state): State<crate::app::AppState>,
    Path(id): Path<String>,
) -> Result<axum::Json<Document>, AppError> {
    let document = state.repo.toggle_bookmark(&id).await?;
    tracing::info!(%id, bookmarked = document.bookmarked(), "Toggled bookmark");
    Ok(axum::Json(document))
}

/// Axum handler for `POST /api/ask/suggestions`.
pub async fn suggestions_handler(
    State(state): State<crate::app::AppState>,
    axum::Json(request): axum::Json<SuggestionRequest>,
) -> Result<axum::Json<SuggestionResponse>, AppError> {
    Ok(axum::Json(process_suggestions(state.repo.as_ref(), request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::InMemoryDocumentRepository;
    use crate::seed::demo_documents;

    fn repo() -> InMemoryDocumentRepository {
        InMemoryDocumentRepository::new(demo_documents().unwrap())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()
    }

    fn query(json: &str) -> DocumentQuery {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_query_defaults_to_first_page() {
        let view = process_query(&repo(), query("{}"), today()).await.unwrap();
        assert_eq!(view.total_count, 35);
        assert_eq!(view.filtered_count, 35);
        assert_eq!(view.current_page, 1);
        assert_eq!(view.documents.len(), 10);
        assert_eq!(view.total_pages, 4);
    }

    #[tokio::test]
    async fn test_query_clamps_page() {
        let view = process_query(&repo(), query(r#"{"page": 99, "pageSize": 20}"#), today())
            .await
            .unwrap();
        assert_eq!(view.current_page, 2);
        assert_eq!(view.documents.len(), 15);
        assert_eq!(view.start_item, 21);
        assert_eq!(view.end_item, 35);
    }

    #[tokio::test]
    async fn test_query_applies_criteria() {
        let view = process_query(
            &repo(),
            query(r#"{"showBookmarksOnly": true, "pageSize": 50}"#),
            today(),
        )
        .await
        .unwrap();
        let ids: Vec<&str> = view.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4", "10"]);
    }

    #[tokio::test]
    async fn test_query_rejects_zero_page_size() {
        let err = process_query(&repo(), query(r#"{"pageSize": 0}"#), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_filter_options() {
        let options = process_filter_options(&repo()).await.unwrap();
        assert_eq!(options.publication_date[0], "All");
        assert_eq!(options.level, vec!["Group", "Business Unit", "Local"]);
        assert!(!options.region.is_empty());
        let mut sorted = options.region.clone();
        sorted.sort();
        assert_eq!(options.region, sorted);
    }

    #[tokio::test]
    async fn test_suggestions_fall_back_to_defaults() {
        let response = process_suggestions(&repo(), SuggestionRequest::default())
            .await
            .unwrap();
        assert_eq!(response.prompts.len(), 5);
        assert_eq!(response.prompts[0], "What is FRY?");

        let unknown = SuggestionRequest {
            selected_documents: vec!["nope".into()],
        };
        let response = process_suggestions(&repo(), unknown).await.unwrap();
        assert_eq!(response.prompts[0], "What is FRY?");
    }
}
