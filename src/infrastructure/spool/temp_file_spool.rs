use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::BufReader;
use tracing::debug;

use crate::application::ports::{BatchReader, BatchSpool, StorageError};
use crate::infrastructure::spool::BUFFER_SIZE;

const FILE_PREFIX: &str = "search-batch-";
const FILE_SUFFIX: &str = ".json";

/// Spool backed by a named temporary file
///
/// The file is removed on `release` or, failing that, when the spool is
/// dropped.
pub struct TempFileSpool {
    // Dropped before `path` so the handle is closed before the file is removed
    writer: Option<BufWriter<File>>,
    path: Option<TempPath>,
    len: u64,
    sealed: bool,
}

impl TempFileSpool {
    /// Create a spool file in the system temp directory
    pub fn new() -> Result<Self, StorageError> {
        let file = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(FILE_SUFFIX)
            .tempfile()?;
        Ok(Self::from_named(file))
    }

    /// Create a spool file inside `dir`
    pub fn new_in(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let file = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(FILE_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self::from_named(file))
    }

    fn from_named(file: tempfile::NamedTempFile) -> Self {
        let (file, path) = file.into_parts();
        debug!(path = %path.display(), "Created spool file");
        Self {
            writer: Some(BufWriter::with_capacity(BUFFER_SIZE, file)),
            path: Some(path),
            len: 0,
            sealed: false,
        }
    }

    /// Location of the backing file, `None` once released
    pub fn path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|p| p.to_path_buf())
    }
}

impl BatchSpool for TempFileSpool {
    fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Err(StorageError::Released);
        }
        let writer = self.writer.as_mut().ok_or(StorageError::Sealed)?;
        writer.write_all(bytes)?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn seal(&mut self) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Err(StorageError::Released);
        }
        if let Some(writer) = self.writer.take() {
            writer.into_inner().map_err(|e| e.into_error())?;
        }
        self.sealed = true;
        Ok(())
    }

    fn open_reader(&self) -> Result<BatchReader, StorageError> {
        let path = self.path.as_ref().ok_or(StorageError::Released)?;
        if !self.sealed {
            return Err(StorageError::NotSealed);
        }
        let file = File::open(path)?;
        Ok(Box::pin(BufReader::with_capacity(
            BUFFER_SIZE,
            tokio::fs::File::from_std(file),
        )))
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn release(&mut self) -> Result<(), StorageError> {
        self.writer = None;
        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "Removing spool file");
            path.close()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TempFileSpool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempFileSpool")
            .field("path", &self.path())
            .field("len", &self.len)
            .field("sealed", &self.sealed)
            .finish()
    }
}
