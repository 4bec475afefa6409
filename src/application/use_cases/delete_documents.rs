use chrono::Utc;
use std::collections::HashSet;
use tracing::info;

use crate::application::dto::UploadSummary;
use crate::application::errors::UploadError;
use crate::application::use_cases::BulkUploadUseCase;
use crate::domain::entities::Document;

/// Use case: remove documents from the search domain by id
///
/// Every delete in one run carries the same version stamp so that the
/// service orders them after any earlier add of the same id.
pub struct DeleteDocumentsUseCase {
    upload: BulkUploadUseCase,
}

impl DeleteDocumentsUseCase {
    pub fn new(upload: BulkUploadUseCase) -> Self {
        Self { upload }
    }

    /// Execute delete workflow with the current epoch second as version
    pub async fn execute<I>(&self, ids: I) -> Result<UploadSummary, UploadError>
    where
        I: IntoIterator<Item = String>,
    {
        self.execute_with_version(ids, Utc::now().timestamp()).await
    }

    pub async fn execute_with_version<I>(
        &self,
        ids: I,
        version: i64,
    ) -> Result<UploadSummary, UploadError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let documents: Vec<Document> = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .map(|id| Document::delete(id).with_version(version))
            .collect();

        info!(count = documents.len(), version, "Deleting documents");
        self.upload.execute(documents).await
    }
}
