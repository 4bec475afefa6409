use tracing::warn;
use uuid::Uuid;

use crate::application::ports::{BatchBody, BatchReader, BatchSpool, StorageError};

/// One packed, upload-ready batch.
///
/// Owns the spool its bytes live in. [`DocumentBatch::close`] consumes the
/// batch, so reading after close cannot be expressed. A batch that is
/// dropped without being closed still releases its spool.
pub struct DocumentBatch {
    batch_id: Uuid,
    size_bytes: u64,
    document_ids: Vec<String>,
    spool: Option<Box<dyn BatchSpool>>,
}

impl DocumentBatch {
    pub(crate) fn new(size_bytes: u64, document_ids: Vec<String>, spool: Box<dyn BatchSpool>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            size_bytes,
            document_ids,
            spool: Some(spool),
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Exact length of the framed content
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Ids of the documents in this batch, in packing order
    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    pub fn document_count(&self) -> usize {
        self.document_ids.len()
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.document_ids.iter().any(|id| id == document_id)
    }

    /// Open a new reader over the framed content
    pub fn open_reader(&self) -> Result<BatchReader, StorageError> {
        match &self.spool {
            Some(spool) => spool.open_reader(),
            None => Err(StorageError::Released),
        }
    }

    /// Release the backing spool
    pub fn close(mut self) -> Result<(), StorageError> {
        match self.spool.take() {
            Some(mut spool) => spool.release(),
            None => Ok(()),
        }
    }
}

impl BatchBody for DocumentBatch {
    fn open(&self) -> Result<BatchReader, StorageError> {
        self.open_reader()
    }

    fn content_length(&self) -> u64 {
        self.size_bytes
    }
}

impl Drop for DocumentBatch {
    fn drop(&mut self) {
        if let Some(mut spool) = self.spool.take() {
            if let Err(e) = spool.release() {
                warn!(batch_id = %self.batch_id, "Failed to release dropped batch: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for DocumentBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBatch")
            .field("batch_id", &self.batch_id)
            .field("size_bytes", &self.size_bytes)
            .field("document_count", &self.document_ids.len())
            .field("released", &self.spool.is_none())
            .finish()
    }
}
