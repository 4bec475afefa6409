use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::application::ports::{BatchReader, BatchSpool, SpoolProvider, StorageError};
use crate::infrastructure::spool::MemorySpool;

/// Spool provider that counts allocations and releases, with optional faults
#[derive(Clone, Default)]
pub(crate) struct CountingSpoolProvider {
    created: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    fail_append_after: Option<usize>,
    fail_seal: bool,
    fail_release: bool,
}

impl CountingSpoolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every spool fails its append once `appends` calls have succeeded
    pub fn failing_append_after(appends: usize) -> Self {
        Self {
            fail_append_after: Some(appends),
            ..Self::default()
        }
    }

    pub fn failing_seal() -> Self {
        Self {
            fail_seal: true,
            ..Self::default()
        }
    }

    /// Spools free their memory but report every release as failed
    pub fn failing_release() -> Self {
        Self {
            fail_release: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl SpoolProvider for CountingSpoolProvider {
    fn create(&self) -> Result<Box<dyn BatchSpool>, StorageError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingSpool {
            inner: MemorySpool::new(),
            released_counter: Arc::clone(&self.released),
            released: false,
            appends: 0,
            fail_append_after: self.fail_append_after,
            fail_seal: self.fail_seal,
            fail_release: self.fail_release,
        }))
    }

    fn kind(&self) -> &'static str {
        "counting"
    }
}

struct CountingSpool {
    inner: MemorySpool,
    released_counter: Arc<AtomicUsize>,
    released: bool,
    appends: usize,
    fail_append_after: Option<usize>,
    fail_seal: bool,
    fail_release: bool,
}

impl BatchSpool for CountingSpool {
    fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_append_after.is_some_and(|limit| self.appends >= limit) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.appends += 1;
        self.inner.append(bytes)
    }

    fn seal(&mut self) -> Result<(), StorageError> {
        if self.fail_seal {
            return Err(StorageError::Io(std::io::Error::other("flush failed")));
        }
        self.inner.seal()
    }

    fn open_reader(&self) -> Result<BatchReader, StorageError> {
        self.inner.open_reader()
    }

    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn release(&mut self) -> Result<(), StorageError> {
        if !self.released {
            self.released = true;
            self.released_counter.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.release()?;
        if self.fail_release {
            return Err(StorageError::Io(std::io::Error::other("unlink failed")));
        }
        Ok(())
    }
}
