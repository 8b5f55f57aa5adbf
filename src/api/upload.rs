use axum::extract::{Multipart, State};
use chrono::Local;

use crate::error::AppError;
use crate::excel::model::ExcelWorkbook;
use crate::excel::parser::parse_workbook;
use crate::upload::documents::{process_upload, IncomingFile, UploadResponse};

const DOCUMENT_FIELD: &str = "files";
const WORKBOOK_FIELD: &str = "excel";

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Multipart error: {e}"))
}

/// Axum handler for `POST /api/documents/upload`.
///
/// Accepts a multipart form with one or more file fields named "files".
/// Only name, type and size are inspected; the bytes are discarded.
pub async fn upload_documents_handler(
    State(state): State<crate::app::AppState>,
    mut multipart: Multipart,
) -> Result<axum::Json<UploadResponse>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name().unwrap_or("") != DOCUMENT_FIELD {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;

        files.push(IncomingFile {
            file_name,
            content_type,
            size: data.len(),
        });
    }

    let response = process_upload(
        files,
        state.config.upload.max_file_bytes,
        Local::now().date_naive(),
        &mut rand::rng(),
    )?;
    Ok(axum::Json(response))
}

/// Axum handler for `POST /api/excel/parse`.
///
/// Reads the first file field named "excel" and returns the parsed workbook.
pub async fn parse_workbook_handler(
    State(state): State<crate::app::AppState>,
    mut multipart: Multipart,
) -> Result<axum::Json<ExcelWorkbook>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name().unwrap_or("") != WORKBOOK_FIELD {
            continue;
        }

        let file_name = field.file_name().unwrap_or("workbook.xlsx").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;

        // calamine is synchronous; keep the parse off the async workers.
        let max_cells = state.config.upload.max_cells;
        let workbook = tokio::task::spawn_blocking(move || parse_workbook(&data, &file_name, max_cells))
            .await
            .map_err(|e| AppError::Internal(format!("Parse task failed: {e}")))??;
        return Ok(axum::Json(workbook));
    }

    Err(AppError::BadRequest("No Excel file uploaded".into()))
}
