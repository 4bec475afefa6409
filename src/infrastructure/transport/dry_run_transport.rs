use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::application::ports::{BatchBody, BatchUploadResponse, DocumentTransport, TransportError};
use crate::domain::value_objects::OperationKind;

/// Transport that validates batches locally instead of sending them
///
/// Each body is read in full, checked against its declared length and parsed
/// as a JSON array of documents. Counts come from the documents' `type`.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    batches: AtomicU64,
    bytes: AtomicU64,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches_seen(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn bytes_seen(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentTransport for DryRunTransport {
    async fn upload(
        &self,
        content_type: &str,
        body: &dyn BatchBody,
    ) -> Result<BatchUploadResponse, TransportError> {
        let declared = body.content_length();
        let mut content = Vec::with_capacity(usize::try_from(declared).unwrap_or(0));
        body.open()?
            .read_to_end(&mut content)
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if content.len() as u64 != declared {
            return Err(TransportError::InvalidResponse(format!(
                "batch declared {} bytes but contained {}",
                declared,
                content.len()
            )));
        }

        let documents: Vec<serde_json::Value> = serde_json::from_slice(&content)
            .map_err(|e| TransportError::InvalidResponse(format!("batch is not a JSON array: {}", e)))?;

        let (mut adds, mut deletes) = (0u64, 0u64);
        for document in &documents {
            match document.get("type").and_then(|t| t.as_str()).map(str::parse::<OperationKind>) {
                Some(Ok(OperationKind::Add)) => adds += 1,
                Some(Ok(OperationKind::Delete)) => deletes += 1,
                _ => {
                    return Err(TransportError::InvalidResponse(format!(
                        "document without a valid type: {}",
                        document
                    )))
                }
            }
        }

        self.batches.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(declared, Ordering::Relaxed);
        info!(
            content_type,
            size_bytes = declared,
            adds,
            deletes,
            "Dry run: batch validated, not sent"
        );
        Ok(BatchUploadResponse::success(adds, deletes))
    }
}
