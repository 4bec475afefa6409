//! Packing of a document stream into size-bounded upload batches.
//!
//! [`DocumentBatchIterator`] pulls documents from an upstream source and
//! drives a fresh [`DocumentBatchBuilder`] per batch. Documents whose size
//! alone exceeds the per-document ceiling are set aside by id; a document
//! that merely did not fit in the batch being closed is carried over to open
//! the next one.

mod batch;
mod builder;
mod iterator;
mod provider;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::DocumentBatch;
pub use builder::DocumentBatchBuilder;
pub use iterator::{DocumentBatchIterator, DocumentSource};
pub use provider::{BuilderProvider, SpooledBuilderProvider};
