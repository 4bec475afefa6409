use bytes::{Bytes, BytesMut};
use std::io::Cursor;

use crate::application::ports::{BatchReader, BatchSpool, StorageError};

/// Spool backed by an in-process buffer
///
/// Sealing freezes the buffer, so every reader shares the same bytes without
/// copying.
#[derive(Debug, Default)]
pub struct MemorySpool {
    buffer: BytesMut,
    sealed: Option<Bytes>,
    len: u64,
    released: bool,
}

impl MemorySpool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl BatchSpool for MemorySpool {
    fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if self.released {
            return Err(StorageError::Released);
        }
        if self.sealed.is_some() {
            return Err(StorageError::Sealed);
        }
        self.buffer.extend_from_slice(bytes);
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn seal(&mut self) -> Result<(), StorageError> {
        if self.released {
            return Err(StorageError::Released);
        }
        if self.sealed.is_none() {
            self.sealed = Some(self.buffer.split().freeze());
        }
        Ok(())
    }

    fn open_reader(&self) -> Result<BatchReader, StorageError> {
        if self.released {
            return Err(StorageError::Released);
        }
        match &self.sealed {
            Some(content) => Ok(Box::pin(Cursor::new(content.clone()))),
            None => Err(StorageError::NotSealed),
        }
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn release(&mut self) -> Result<(), StorageError> {
        self.buffer = BytesMut::new();
        self.sealed = None;
        self.released = true;
        Ok(())
    }
}
