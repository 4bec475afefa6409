//! Error types shared by the batching pipeline and the upload use cases

use thiserror::Error;

use crate::application::ports::{StorageError, TransportError};
use crate::domain::errors::DomainError;

/// Errors raised while packing documents into batches
#[derive(Debug, Error)]
pub enum BatchingError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(
        "Document {id} is {size_bytes} bytes, over the single document limit of {max_bytes} bytes"
    )]
    DocumentExceedsSingleLimit {
        id: String,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("Carried-over document {0} did not fit in an empty batch")]
    CarryOverRejected(String),

    #[error("Builder is unusable after an earlier storage failure")]
    BuilderPoisoned,

    #[error("next_batch called without a ready batch; call has_next first")]
    NoBatchReady,

    #[error("Oversized document ids requested before iteration finished")]
    IterationNotFinished,

    #[error("Iterator stopped after an earlier failure")]
    IteratorFailed,

    #[error("Document source failed: {0}")]
    Source(String),
}

/// Errors raised while uploading batches
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Batching error: {0}")]
    Batching(#[from] BatchingError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Batch {batch_id} rejected by document service with status {status}")]
    BatchRejected { batch_id: String, status: String },
}
