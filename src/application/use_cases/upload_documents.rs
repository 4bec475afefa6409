use std::sync::Arc;
use tracing::{info, warn};

use crate::application::batching::{BuilderProvider, DocumentBatch, DocumentBatchIterator};
use crate::application::dto::{BatchOutcomeDto, UploadOptions, UploadSummary};
use crate::application::errors::UploadError;
use crate::application::ports::{
    BatchOutcomeReporter, BatchUploadResponse, DocumentTransport, TransportError,
};
use crate::domain::entities::Document;

/// Content type of every batch body
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Status reported for documents whose batch never got a service answer
pub const STATUS_TRANSPORT_ERROR: &str = "transport_error";

/// Use case: pack documents and upload them batch by batch
///
/// Exactly one batch is open at a time. Every batch is closed before the next
/// one is materialized, whether its upload succeeded or not.
pub struct BulkUploadUseCase {
    builders: Arc<dyn BuilderProvider>,
    transport: Arc<dyn DocumentTransport>,
    reporter: Arc<dyn BatchOutcomeReporter>,
    options: UploadOptions,
}

impl BulkUploadUseCase {
    pub fn new(
        builders: Arc<dyn BuilderProvider>,
        transport: Arc<dyn DocumentTransport>,
        reporter: Arc<dyn BatchOutcomeReporter>,
        options: UploadOptions,
    ) -> Self {
        Self {
            builders,
            transport,
            reporter,
            options,
        }
    }

    pub fn builders(&self) -> Arc<dyn BuilderProvider> {
        Arc::clone(&self.builders)
    }

    /// Execute upload workflow for an in-memory or lazy document sequence
    pub async fn execute<I>(&self, documents: I) -> Result<UploadSummary, UploadError>
    where
        I: IntoIterator<Item = Document>,
        I::IntoIter: Send + 'static,
    {
        let batches = DocumentBatchIterator::from_documents(documents, Arc::clone(&self.builders));
        self.execute_batches(batches).await
    }

    /// Drain a batch iterator, uploading each batch
    pub async fn execute_batches(
        &self,
        mut batches: DocumentBatchIterator,
    ) -> Result<UploadSummary, UploadError> {
        let mut summary = UploadSummary::default();

        while batches.has_next()? {
            let batch = batches.next_batch()?;
            let batch_id = batch.batch_id().to_string();
            let document_count = batch.document_count();
            let size_bytes = batch.size_bytes();

            let outcome = self.upload_batch(&batch).await;
            if let Err(e) = batch.close() {
                warn!(batch_id = %batch_id, "Failed to release uploaded batch: {}", e);
                summary.release_failures += 1;
            }

            let response = outcome?;
            summary.bytes_uploaded += size_bytes;
            summary.adds += response.adds;
            summary.deletes += response.deletes;
            summary.batches.push(BatchOutcomeDto::from_response(
                batch_id.clone(),
                document_count,
                size_bytes,
                &response,
            ));

            if response.is_success() {
                summary.batches_uploaded += 1;
                summary.documents_uploaded += document_count as u64;
            } else {
                summary.batches_failed += 1;
                warn!(
                    batch_id = %batch_id,
                    status = %response.status,
                    errors = ?response.errors,
                    "Document service did not accept batch"
                );
                if self.options.stop_on_batch_failure {
                    return Err(UploadError::BatchRejected {
                        batch_id,
                        status: response.status,
                    });
                }
            }
        }

        summary.oversized_document_ids = batches.documents_exceeding_single_size_limit()?.to_vec();
        if !summary.oversized_document_ids.is_empty() {
            warn!(
                count = summary.oversized_document_ids.len(),
                ids = ?summary.oversized_document_ids,
                "Documents skipped for exceeding the single document size limit"
            );
        }

        info!(
            batches_uploaded = summary.batches_uploaded,
            batches_failed = summary.batches_failed,
            documents_uploaded = summary.documents_uploaded,
            bytes_uploaded = summary.bytes_uploaded,
            "Bulk upload finished"
        );
        Ok(summary)
    }

    async fn upload_batch(
        &self,
        batch: &DocumentBatch,
    ) -> Result<BatchUploadResponse, TransportError> {
        let result = self.transport.upload(CONTENT_TYPE_JSON, batch).await;
        let status = match &result {
            Ok(response) => response.status.as_str(),
            Err(_) => STATUS_TRANSPORT_ERROR,
        };
        self.reporter
            .report_batch_outcome(batch.document_ids(), status);
        result
    }
}
