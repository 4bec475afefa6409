use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(
        "Invalid batch limits: max single document size {max_single_document_size} plus \
         {framing_overhead} bytes of framing exceeds max batch size {max_batch_size}"
    )]
    InvalidBatchLimits {
        max_single_document_size: u64,
        max_batch_size: u64,
        framing_overhead: u64,
    },

    #[error("Batch limit must be greater than zero: {0}")]
    ZeroLimit(&'static str),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid operation kind: {0}")]
    InvalidOperationKind(String),

    #[error("Document serialization failed for {id}: {reason}")]
    Serialization { id: String, reason: String },
}
