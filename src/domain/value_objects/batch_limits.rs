use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Opening frame of a batch
pub const BATCH_PREFIX: &[u8] = b"[";
/// Separator written between two documents
pub const BATCH_DELIMITER: &[u8] = b",";
/// Closing frame of a batch
pub const BATCH_SUFFIX: &[u8] = b"]";
/// Fixed bytes every batch carries regardless of content
pub const FRAMING_OVERHEAD: u64 = (BATCH_PREFIX.len() + BATCH_SUFFIX.len()) as u64;

/// How a document exactly at the single-document limit is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LimitBoundary {
    /// Oversized means strictly larger than the limit
    #[default]
    AllowEqual,
    /// A document at the limit is already oversized
    RejectEqual,
}

impl std::fmt::Display for LimitBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitBoundary::AllowEqual => write!(f, "allow_equal"),
            LimitBoundary::RejectEqual => write!(f, "reject_equal"),
        }
    }
}

impl std::str::FromStr for LimitBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow_equal" | "inclusive" => Ok(LimitBoundary::AllowEqual),
            "reject_equal" | "exclusive" => Ok(LimitBoundary::RejectEqual),
            _ => Err(format!("Invalid limit boundary: {}", s)),
        }
    }
}

/// Size ceilings applied while packing documents into batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    max_single_document_size: u64,
    max_batch_size: u64,
    boundary: LimitBoundary,
}

impl BatchLimits {
    /// 1 MiB, the service's per-document ceiling
    pub const DEFAULT_MAX_SINGLE_DOCUMENT_SIZE: u64 = 1024 * 1024;
    /// 5 MiB, the service's per-request ceiling
    pub const DEFAULT_MAX_BATCH_SIZE: u64 = 5 * 1024 * 1024;

    /// Validate the pair of ceilings.
    ///
    /// Any document that passes the single-document check must fit in an
    /// empty batch, so `max_single_document_size + FRAMING_OVERHEAD` may not
    /// exceed `max_batch_size`.
    pub fn new(max_single_document_size: u64, max_batch_size: u64) -> Result<Self, DomainError> {
        Self::with_boundary(
            max_single_document_size,
            max_batch_size,
            LimitBoundary::default(),
        )
    }

    pub fn with_boundary(
        max_single_document_size: u64,
        max_batch_size: u64,
        boundary: LimitBoundary,
    ) -> Result<Self, DomainError> {
        if max_single_document_size == 0 {
            return Err(DomainError::ZeroLimit("max_single_document_size"));
        }
        if max_batch_size == 0 {
            return Err(DomainError::ZeroLimit("max_batch_size"));
        }

        let required = max_single_document_size
            .checked_add(FRAMING_OVERHEAD)
            .unwrap_or(u64::MAX);
        if required > max_batch_size {
            return Err(DomainError::InvalidBatchLimits {
                max_single_document_size,
                max_batch_size,
                framing_overhead: FRAMING_OVERHEAD,
            });
        }

        Ok(Self {
            max_single_document_size,
            max_batch_size,
            boundary,
        })
    }

    pub fn max_single_document_size(&self) -> u64 {
        self.max_single_document_size
    }

    pub fn max_batch_size(&self) -> u64 {
        self.max_batch_size
    }

    pub fn boundary(&self) -> LimitBoundary {
        self.boundary
    }

    /// Whether a serialized document of this size can never be batched
    #[inline]
    pub fn is_oversized(&self, size_bytes: u64) -> bool {
        match self.boundary {
            LimitBoundary::AllowEqual => size_bytes > self.max_single_document_size,
            LimitBoundary::RejectEqual => size_bytes >= self.max_single_document_size,
        }
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_single_document_size: Self::DEFAULT_MAX_SINGLE_DOCUMENT_SIZE,
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
            boundary: LimitBoundary::AllowEqual,
        }
    }
}
