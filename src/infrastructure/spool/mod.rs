mod adaptive_spool_provider;
mod memory_spool;
mod temp_file_spool;

pub use adaptive_spool_provider::{AdaptiveSpoolProvider, SpoolStrategy, DEFAULT_MEMORY_THRESHOLD};
pub use memory_spool::MemorySpool;
pub use temp_file_spool::TempFileSpool;

/// Buffer size for spool reads and writes
pub(crate) const BUFFER_SIZE: usize = 256 * 1024;
