use tracing::{error, info};

use crate::application::ports::{BatchOutcomeReporter, BatchUploadResponse};

/// Reports batch outcomes as structured `tracing` events
///
/// Successful batches log at `info`, everything else at `error`, one event per
/// document so ids stay searchable in log pipelines.
#[derive(Debug, Clone, Default)]
pub struct TracingOutcomeReporter;

impl TracingOutcomeReporter {
    pub fn new() -> Self {
        Self
    }
}

impl BatchOutcomeReporter for TracingOutcomeReporter {
    fn report_batch_outcome(&self, document_ids: &[String], status: &str) {
        let success = status == BatchUploadResponse::STATUS_SUCCESS;
        for id in document_ids {
            if success {
                info!(target: "search_batcher::audit", document_id = %id, status, "document uploaded");
            } else {
                error!(target: "search_batcher::audit", document_id = %id, status, "document upload failed");
            }
        }
    }
}
