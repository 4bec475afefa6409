use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::application::ports::{BatchSpool, SpoolProvider, StorageError};
use crate::infrastructure::spool::{MemorySpool, TempFileSpool};

/// Batches up to this size are buffered in memory under [`SpoolStrategy::Auto`]
pub const DEFAULT_MEMORY_THRESHOLD: u64 = 1024 * 1024;

/// Where batch bytes are staged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpoolStrategy {
    /// Memory for small batches, temp files for large ones
    #[default]
    Auto,
    Memory,
    File,
}

impl fmt::Display for SpoolStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpoolStrategy::Auto => write!(f, "auto"),
            SpoolStrategy::Memory => write!(f, "memory"),
            SpoolStrategy::File => write!(f, "file"),
        }
    }
}

impl FromStr for SpoolStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SpoolStrategy::Auto),
            "memory" => Ok(SpoolStrategy::Memory),
            "file" => Ok(SpoolStrategy::File),
            other => Err(format!("Unknown spool strategy: {}", other)),
        }
    }
}

/// Spool provider that picks memory or file staging once, from the batch size
#[derive(Debug, Clone)]
pub struct AdaptiveSpoolProvider {
    use_memory: bool,
    memory_capacity: usize,
    temp_dir: Option<PathBuf>,
}

impl AdaptiveSpoolProvider {
    pub fn new(
        strategy: SpoolStrategy,
        max_batch_size: u64,
        memory_threshold: u64,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        let use_memory = match strategy {
            SpoolStrategy::Memory => true,
            SpoolStrategy::File => false,
            SpoolStrategy::Auto => max_batch_size <= memory_threshold,
        };
        let provider = Self {
            use_memory,
            memory_capacity: usize::try_from(max_batch_size).unwrap_or(usize::MAX).min(1 << 20),
            temp_dir,
        };
        info!(
            %strategy,
            kind = provider.kind(),
            max_batch_size,
            temp_dir = ?provider.temp_dir,
            "Configured batch spool"
        );
        provider
    }

    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    /// Create the temp directory if file spooling is in use
    pub fn init(&self) -> Result<(), StorageError> {
        if let (false, Some(dir)) = (self.use_memory, &self.temp_dir) {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl SpoolProvider for AdaptiveSpoolProvider {
    fn create(&self) -> Result<Box<dyn BatchSpool>, StorageError> {
        if self.use_memory {
            return Ok(Box::new(MemorySpool::with_capacity(self.memory_capacity)));
        }
        let spool = match &self.temp_dir {
            Some(dir) => TempFileSpool::new_in(dir)?,
            None => TempFileSpool::new()?,
        };
        Ok(Box::new(spool))
    }

    fn kind(&self) -> &'static str {
        if self.use_memory {
            "memory"
        } else {
            "file"
        }
    }
}
