use std::path::Path;

use crate::error::AppError;
use crate::models::document::Document;

/// Demo catalog embedded into the binary.
const DEMO_CATALOG: &str = include_str!("../demo_data/documents.json");

/// Parse a JSON array of documents, rejecting duplicate ids.
pub fn parse_catalog(json: &str) -> Result<Vec<Document>, AppError> {
    let documents: Vec<Document> = serde_json::from_str(json)
        .map_err(|e| AppError::Config(format!("Invalid document catalog: {e}")))?;

    let mut seen = std::collections::HashSet::new();
    for doc in &documents {
        if !seen.insert(doc.id.as_str()) {
            return Err(AppError::Config(format!(
                "Duplicate document id '{}' in catalog",
                doc.id
            )));
        }
    }
    Ok(documents)
}

pub fn demo_documents() -> Result<Vec<Document>, AppError> {
    parse_catalog(DEMO_CATALOG)
}

/// Load the catalog named in config, or the embedded demo data.
pub async fn load_catalog(path: Option<&Path>) -> Result<Vec<Document>, AppError> {
    let documents = match path {
        Some(path) => {
            tracing::info!("Loading document catalog from {}", path.display());
            let json = tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::Config(format!("Cannot read catalog {}: {e}", path.display()))
            })?;
            parse_catalog(&json)?
        }
        None => {
            tracing::info!("Loading embedded demo catalog");
            demo_documents()?
        }
    };
    tracing::info!("Loaded {} documents", documents.len());
    Ok(documents)
}
