use tracing::{debug, warn};

use crate::application::batching::DocumentBatch;
use crate::application::errors::BatchingError;
use crate::application::ports::BatchSpool;
use crate::domain::entities::SerializedDocument;
use crate::domain::value_objects::{BatchLimits, BATCH_DELIMITER, BATCH_PREFIX, BATCH_SUFFIX};

/// Accumulates documents into a single framed batch.
///
/// The opening frame is written when the builder is created. Each accepted
/// document is preceded by a delimiter unless it is the first one. The
/// builder is consumed by [`DocumentBatchBuilder::build`]; if it is dropped
/// instead, or a write fails, its spool is released on the spot.
pub struct DocumentBatchBuilder {
    limits: BatchLimits,
    spool: Option<Box<dyn BatchSpool>>,
    size_bytes: u64,
    document_ids: Vec<String>,
}

impl DocumentBatchBuilder {
    pub fn new(limits: BatchLimits, spool: Box<dyn BatchSpool>) -> Result<Self, BatchingError> {
        let mut builder = Self {
            limits,
            spool: Some(spool),
            size_bytes: 0,
            document_ids: Vec::new(),
        };
        builder.write(BATCH_PREFIX)?;
        builder.size_bytes = BATCH_PREFIX.len() as u64;
        Ok(builder)
    }

    pub fn limits(&self) -> &BatchLimits {
        &self.limits
    }

    /// Bytes written so far, opening frame included
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn document_count(&self) -> usize {
        self.document_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document_ids.is_empty()
    }

    /// Try to append a document.
    ///
    /// Returns `Ok(false)` without touching any state when the document would
    /// push the closed batch past `max_batch_size`, so the caller can offer
    /// the same document to a fresh builder. A document over the
    /// single-document ceiling is an error, distinct from "does not fit".
    pub fn try_add(&mut self, document: &SerializedDocument) -> Result<bool, BatchingError> {
        if self.spool.is_none() {
            return Err(BatchingError::BuilderPoisoned);
        }

        let document_size = document.size_bytes();
        if self.limits.is_oversized(document_size) {
            return Err(BatchingError::DocumentExceedsSingleLimit {
                id: document.id().to_string(),
                size_bytes: document_size,
                max_bytes: self.limits.max_single_document_size(),
            });
        }

        let delimiter: &[u8] = if self.document_ids.is_empty() {
            &[]
        } else {
            BATCH_DELIMITER
        };
        let projected = self.size_bytes
            + delimiter.len() as u64
            + document_size
            + BATCH_SUFFIX.len() as u64;
        if projected > self.limits.max_batch_size() {
            debug!(
                document_id = document.id(),
                document_size,
                batch_size = self.size_bytes,
                "Document does not fit in current batch"
            );
            return Ok(false);
        }

        self.write(delimiter)?;
        self.write(document.as_bytes())?;
        self.size_bytes += delimiter.len() as u64 + document_size;
        self.document_ids.push(document.id().to_string());
        Ok(true)
    }

    /// Close the frame and hand the spool over to a [`DocumentBatch`]
    pub fn build(mut self) -> Result<DocumentBatch, BatchingError> {
        self.write(BATCH_SUFFIX)?;
        self.size_bytes += BATCH_SUFFIX.len() as u64;

        let mut spool = self.spool.take().ok_or(BatchingError::BuilderPoisoned)?;
        if let Err(e) = spool.seal() {
            Self::release_after_failure(spool.as_mut());
            return Err(e.into());
        }
        debug_assert_eq!(spool.len(), self.size_bytes);

        let document_ids = std::mem::take(&mut self.document_ids);
        Ok(DocumentBatch::new(self.size_bytes, document_ids, spool))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BatchingError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let spool = self.spool.as_mut().ok_or(BatchingError::BuilderPoisoned)?;
        if let Err(e) = spool.append(bytes) {
            // The builder cannot produce a consistent batch after a partial write
            if let Some(mut spool) = self.spool.take() {
                Self::release_after_failure(spool.as_mut());
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn release_after_failure(spool: &mut dyn BatchSpool) {
        if let Err(e) = spool.release() {
            warn!("Failed to release spool after write failure: {}", e);
        }
    }
}

impl Drop for DocumentBatchBuilder {
    fn drop(&mut self) {
        if let Some(mut spool) = self.spool.take() {
            if let Err(e) = spool.release() {
                warn!("Failed to release spool of abandoned builder: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for DocumentBatchBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBatchBuilder")
            .field("limits", &self.limits)
            .field("size_bytes", &self.size_bytes)
            .field("document_count", &self.document_ids.len())
            .field("poisoned", &self.spool.is_none())
            .finish()
    }
}
