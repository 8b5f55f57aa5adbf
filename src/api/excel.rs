use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::AppError;
use crate::excel::analysis::{process_analyze, AnalyzeRequest, ExcelAnalysis};
use crate::excel::samples::{build_sample, SampleKind, XLSX_CONTENT_TYPE};

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Axum handler for `POST /api/excel/analyze`.
pub async fn analyze_workbook_handler(
    State(state): State<crate::app::AppState>,
    axum::Json(request): axum::Json<AnalyzeRequest>,
) -> Result<axum::Json<ExcelAnalysis>, AppError> {
    Ok(axum::Json(process_analyze(state.analysis.as_ref(), request)?))
}

/// Axum handler for `GET /api/excel/download?type=`.
pub async fn download_sample_handler(
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let kind = SampleKind::from_query(query.kind.as_deref());
    let sample = tokio::task::spawn_blocking(move || build_sample(kind))
        .await
        .map_err(|e| AppError::Internal(format!("Sample task failed: {e}")))??;

    tracing::info!(file_name = %sample.file_name, bytes = sample.bytes.len(), "Serving sample workbook");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", sample.file_name),
            ),
        ],
        sample.bytes,
    )
        .into_response())
}
