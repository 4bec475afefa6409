mod batch_outcome_reporter;
mod batch_spool;
mod document_transport;

pub use batch_outcome_reporter::BatchOutcomeReporter;
pub use batch_spool::{BatchReader, BatchSpool, SpoolProvider, StorageError};
pub use document_transport::{
    BatchBody, BatchUploadResponse, DocumentTransport, ServiceMessage, TransportError,
};

#[cfg(test)]
pub use batch_outcome_reporter::MockBatchOutcomeReporter;
