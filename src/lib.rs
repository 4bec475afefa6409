//! # search_batcher - Size-Bounded Document Batch Upload
//!
//! Packs a lazy stream of search documents into JSON array batches that never
//! exceed a byte ceiling, and uploads them one at a time to a CloudSearch-style
//! document service.
//!
//! ## Architecture Layers
//!
//! - **Domain**: Documents, field values, batch limits, text sanitization
//! - **Application**: Batch builder and iterator, upload use cases, ports
//! - **Infrastructure**: Spools (memory, temp file), HTTP transport, audit sinks
//!
//! ## Key Features
//!
//! - Exact byte accounting: every accepted batch fits `max_batch_size`
//! - Documents that do not fit are carried over to open the next batch
//! - Oversized documents are skipped and reported by id
//! - Every batch's backing spool is released on every exit path
//!
//! ## Example Usage
//!
//! ```no_run
//! use search_batcher::application::batching::{DocumentBatchIterator, SpooledBuilderProvider};
//! use search_batcher::domain::entities::Document;
//! use search_batcher::domain::value_objects::BatchLimits;
//! use search_batcher::infrastructure::spool::{AdaptiveSpoolProvider, SpoolStrategy};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limits = BatchLimits::default();
//! let spools = AdaptiveSpoolProvider::new(SpoolStrategy::Memory, limits.max_batch_size(), 0, None);
//! let builders = Arc::new(SpooledBuilderProvider::new(limits, Arc::new(spools)));
//!
//! let documents = vec![Document::add("1").with_field("title", "Star Wars")];
//! for batch in DocumentBatchIterator::from_documents(documents, builders) {
//!     let batch = batch?;
//!     println!("{} documents, {} bytes", batch.document_count(), batch.size_bytes());
//!     batch.close()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use application::{batching, dto, ports, use_cases};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
