use std::iter::Fuse;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::batching::{BuilderProvider, DocumentBatch, DocumentBatchBuilder};
use crate::application::errors::BatchingError;
use crate::domain::entities::{Document, SerializedDocument};

/// Upstream sequence of documents, already serialized
pub type DocumentSource =
    Box<dyn Iterator<Item = Result<SerializedDocument, BatchingError>> + Send>;

#[derive(Debug)]
enum Phase {
    /// No batch materialized yet
    Idle,
    /// A batch is buffered and waiting for `next_batch`
    HasNext(DocumentBatch),
    /// Source drained and nothing carried over
    Exhausted,
    /// Materialization failed; terminal
    Failed,
}

/// Mutable state of a [`DocumentBatchIterator`], kept apart from the source
#[derive(Debug)]
struct IteratorState {
    phase: Phase,
    carry_over: Option<SerializedDocument>,
    oversized_document_ids: Vec<String>,
}

impl IteratorState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            carry_over: None,
            oversized_document_ids: Vec::new(),
        }
    }

    fn take_buffered(&mut self) -> Option<DocumentBatch> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::HasNext(batch) => Some(batch),
            other => {
                self.phase = other;
                None
            }
        }
    }

    fn record_oversized(&mut self, document_id: &str) {
        self.oversized_document_ids.push(document_id.to_string());
    }

    fn is_exhausted(&self) -> bool {
        matches!(self.phase, Phase::Exhausted)
    }
}

/// Lazy, finite, non-restartable sequence of [`DocumentBatch`] values.
///
/// Drive it with [`has_next`](Self::has_next) / [`next_batch`](Self::next_batch)
/// or through its [`Iterator`] impl. Not thread-safe.
pub struct DocumentBatchIterator {
    source: Fuse<DocumentSource>,
    builders: Arc<dyn BuilderProvider>,
    state: IteratorState,
    batches_produced: u64,
}

impl DocumentBatchIterator {
    pub fn new(source: DocumentSource, builders: Arc<dyn BuilderProvider>) -> Self {
        Self {
            source: source.fuse(),
            builders,
            state: IteratorState::new(),
            batches_produced: 0,
        }
    }

    /// Serialize documents lazily as they are pulled
    pub fn from_documents<I>(documents: I, builders: Arc<dyn BuilderProvider>) -> Self
    where
        I: IntoIterator<Item = Document>,
        I::IntoIter: Send + 'static,
    {
        let source = documents.into_iter().map(|document| {
            SerializedDocument::from_document(&document).map_err(BatchingError::from)
        });
        Self::new(Box::new(source), builders)
    }

    pub fn from_serialized<I>(documents: I, builders: Arc<dyn BuilderProvider>) -> Self
    where
        I: IntoIterator<Item = SerializedDocument>,
        I::IntoIter: Send + 'static,
    {
        Self::new(
            Box::new(documents.into_iter().map(Ok::<_, BatchingError>)),
            builders,
        )
    }

    /// Whether another batch is available, materializing it if needed.
    ///
    /// Repeated calls without `next_batch` in between return the same answer
    /// and pull nothing further from the source. After an error the iterator
    /// is spent and keeps returning [`BatchingError::IteratorFailed`].
    pub fn has_next(&mut self) -> Result<bool, BatchingError> {
        match self.state.phase {
            Phase::HasNext(_) => return Ok(true),
            Phase::Exhausted => return Ok(false),
            Phase::Failed => return Err(BatchingError::IteratorFailed),
            Phase::Idle => {}
        }

        match self.materialize() {
            Ok(Some(batch)) => {
                self.batches_produced += 1;
                info!(
                    batch_id = %batch.batch_id(),
                    batch_number = self.batches_produced,
                    documents = batch.document_count(),
                    size_bytes = batch.size_bytes(),
                    "Materialized document batch"
                );
                self.state.phase = Phase::HasNext(batch);
                Ok(true)
            }
            Ok(None) => {
                debug!(
                    batches = self.batches_produced,
                    oversized = self.state.oversized_document_ids.len(),
                    "Document source exhausted"
                );
                self.state.phase = Phase::Exhausted;
                Ok(false)
            }
            Err(e) => {
                warn!("Batch materialization failed: {}", e);
                self.state.phase = Phase::Failed;
                self.state.carry_over = None;
                Err(e)
            }
        }
    }

    /// Hand out the batch readied by the last successful `has_next`
    pub fn next_batch(&mut self) -> Result<DocumentBatch, BatchingError> {
        self.state
            .take_buffered()
            .ok_or(BatchingError::NoBatchReady)
    }

    /// Ids of documents too large to ever be batched, in source order.
    ///
    /// Only available once `has_next` has returned `false`.
    pub fn documents_exceeding_single_size_limit(&self) -> Result<&[String], BatchingError> {
        if self.state.is_exhausted() {
            Ok(&self.state.oversized_document_ids)
        } else {
            Err(BatchingError::IterationNotFinished)
        }
    }

    pub fn batches_produced(&self) -> u64 {
        self.batches_produced
    }

    fn materialize(&mut self) -> Result<Option<DocumentBatch>, BatchingError> {
        let limits = self.builders.limits();
        let mut builder: Option<DocumentBatchBuilder> = None;

        if let Some(document) = self.state.carry_over.take() {
            let mut fresh = self.builders.new_builder()?;
            if !fresh.try_add(&document)? {
                return Err(BatchingError::CarryOverRejected(document.id().to_string()));
            }
            builder = Some(fresh);
        }

        for next in self.source.by_ref() {
            let document = next?;

            if limits.is_oversized(document.size_bytes()) {
                warn!(
                    document_id = document.id(),
                    size_bytes = document.size_bytes(),
                    max_bytes = limits.max_single_document_size(),
                    "Document exceeds single document size limit, excluding from batches"
                );
                self.state.record_oversized(document.id());
                continue;
            }

            if builder.is_none() {
                builder = Some(self.builders.new_builder()?);
            }
            let added = match builder.as_mut() {
                Some(current) => current.try_add(&document)?,
                None => false,
            };
            if !added {
                debug!(
                    document_id = document.id(),
                    "Carrying document over to the next batch"
                );
                self.state.carry_over = Some(document);
                break;
            }
        }

        match builder {
            Some(builder) => Ok(Some(builder.build()?)),
            None => Ok(None),
        }
    }
}

impl Iterator for DocumentBatchIterator {
    type Item = Result<DocumentBatch, BatchingError>;

    /// Yields each error once, then ends
    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state.phase, Phase::Failed) {
            return None;
        }
        match self.has_next() {
            Ok(true) => Some(self.next_batch()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::fmt::Debug for DocumentBatchIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBatchIterator")
            .field("state", &self.state)
            .field("batches_produced", &self.batches_produced)
            .finish()
    }
}
