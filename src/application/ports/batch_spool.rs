use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spool already released")]
    Released,

    #[error("Spool is sealed and cannot accept more bytes")]
    Sealed,

    #[error("Spool must be sealed before it can be read")]
    NotSealed,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Type alias for async reader over a spooled batch
pub type BatchReader = Pin<Box<dyn AsyncRead + Send + Sync>>;

/// Backing resource holding the bytes of one batch
///
/// Written sequentially while a batch is built, sealed once, then read any
/// number of times until released. `release` must be safe to call twice.
pub trait BatchSpool: Send + Sync {
    /// Append bytes to the end of the spool
    fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Flush buffered bytes; no appends are accepted afterwards
    fn seal(&mut self) -> Result<(), StorageError>;

    /// Open a fresh reader positioned at the first byte
    fn open_reader(&self) -> Result<BatchReader, StorageError>;

    /// Number of bytes appended so far
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free the backing resource
    fn release(&mut self) -> Result<(), StorageError>;
}

/// Port for allocating spools, one per batch
pub trait SpoolProvider: Send + Sync {
    fn create(&self) -> Result<Box<dyn BatchSpool>, StorageError>;

    /// Short name for logs
    fn kind(&self) -> &'static str;
}
