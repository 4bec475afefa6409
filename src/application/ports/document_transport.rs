use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BatchReader, StorageError};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Document service unavailable after {attempts} attempts (last status: {last_status:?})")]
    Unavailable {
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error("Document service rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response from document service: {0}")]
    InvalidResponse(String),

    #[error("Failed to read batch body: {0}")]
    Body(#[from] StorageError),

    #[error("Invalid transport configuration: {0}")]
    Configuration(String),
}

/// Re-openable upload body with a declared length
pub trait BatchBody: Send + Sync {
    fn open(&self) -> Result<BatchReader, StorageError>;

    fn content_length(&self) -> u64;
}

/// Message attached to a batch response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMessage {
    pub message: String,
}

/// Response body of a document batch upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUploadResponse {
    pub status: String,
    #[serde(default)]
    pub adds: u64,
    #[serde(default)]
    pub deletes: u64,
    #[serde(default)]
    pub errors: Vec<ServiceMessage>,
    #[serde(default)]
    pub warnings: Vec<ServiceMessage>,
}

impl BatchUploadResponse {
    pub const STATUS_SUCCESS: &'static str = "success";
    pub const STATUS_ERROR: &'static str = "error";

    pub fn success(adds: u64, deletes: u64) -> Self {
        Self {
            status: Self::STATUS_SUCCESS.to_string(),
            adds,
            deletes,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::STATUS_SUCCESS
    }
}

/// Port for pushing a batch to the remote document service.
///
/// Retrying transient unavailability is the transport's job; the body can be
/// re-opened for every attempt.
#[async_trait]
pub trait DocumentTransport: Send + Sync {
    async fn upload(
        &self,
        content_type: &str,
        body: &dyn BatchBody,
    ) -> Result<BatchUploadResponse, TransportError>;
}
