use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::document::Document;

/// Repository trait for document operations.
///
/// This trait allows swapping the store in tests.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// All documents in store order.
    async fn list_all(&self) -> Result<Vec<Document>, AppError>;

    /// Find a document by its id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError>;

    /// Find documents by id, keeping the order of `ids` and skipping unknown ones.
    async fn find_many(&self, ids: &[String]) -> Result<Vec<Document>, AppError>;

    /// Flip the bookmark flag and return the updated document.
    async fn toggle_bookmark(&self, id: &str) -> Result<Document, AppError>;
}

/// Process-lifetime store guarded by an async `RwLock`.
pub struct InMemoryDocumentRepository {
    documents: RwLock<Vec<Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn list_all(&self) -> Result<Vec<Document>, AppError> {
        Ok(self.documents.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| d.id == id).cloned())
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<Document>, AppError> {
        let documents = self.documents.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| documents.iter().find(|d| &d.id == id).cloned())
            .collect())
    }

    async fn toggle_bookmark(&self, id: &str) -> Result<Document, AppError> {
        let mut documents = self.documents.write().await;
        let doc = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Document '{id}' not found")))?;
        doc.toggle_bookmark();
        Ok(doc.clone())
    }
}
