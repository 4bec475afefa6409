use serde::{Deserialize, Serialize};

use crate::application::ports::BatchUploadResponse;

/// Knobs for the upload loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Abort on the first batch the service answers with a non-success status
    pub stop_on_batch_failure: bool,
}

/// Outcome of one uploaded batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcomeDto {
    pub batch_id: String,
    pub document_count: usize,
    pub size_bytes: u64,
    pub status: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BatchOutcomeDto {
    pub fn from_response(
        batch_id: String,
        document_count: usize,
        size_bytes: u64,
        response: &BatchUploadResponse,
    ) -> Self {
        Self {
            batch_id,
            document_count,
            size_bytes,
            status: response.status.clone(),
            errors: response.errors.iter().map(|m| m.message.clone()).collect(),
            warnings: response.warnings.iter().map(|m| m.message.clone()).collect(),
        }
    }
}

/// Totals for a whole upload run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadSummary {
    pub batches_uploaded: u64,
    pub batches_failed: u64,
    pub documents_uploaded: u64,
    pub bytes_uploaded: u64,
    pub adds: u64,
    pub deletes: u64,
    /// Batches whose spool could not be released cleanly
    pub release_failures: u64,
    /// Documents never sent because they exceed the single document limit
    pub oversized_document_ids: Vec<String>,
    pub batches: Vec<BatchOutcomeDto>,
}

impl UploadSummary {
    pub fn is_clean(&self) -> bool {
        self.batches_failed == 0 && self.oversized_document_ids.is_empty()
    }
}
