use bytes::Bytes;

use crate::domain::entities::Document;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::OperationKind;

/// A document encoded once, with its exact byte length known up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedDocument {
    id: String,
    operation: OperationKind,
    bytes: Bytes,
}

impl SerializedDocument {
    /// Clean and JSON-encode a document
    pub fn from_document(document: &Document) -> Result<Self, DomainError> {
        let cleaned = document.cleaned()?;
        let bytes = serde_json::to_vec(&cleaned).map_err(|e| DomainError::Serialization {
            id: cleaned.id().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            id: cleaned.id().to_string(),
            operation: cleaned.operation(),
            bytes: Bytes::from(bytes),
        })
    }

    /// Wrap bytes that were already encoded by the caller.
    ///
    /// The bytes are trusted to be a single clean JSON value.
    pub fn from_parts(
        id: impl Into<String>,
        operation: OperationKind,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: id.into(),
            operation,
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl TryFrom<&Document> for SerializedDocument {
    type Error = DomainError;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        Self::from_document(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_matches_utf8_bytes_not_chars() {
        let doc = Document::delete("é").with_version(1);
        let serialized = SerializedDocument::from_document(&doc).unwrap();
        let expected = r#"{"type":"delete","id":"é","version":1}"#;
        assert_eq!(serialized.as_bytes(), expected.as_bytes());
        assert_eq!(serialized.size_bytes(), expected.len() as u64);
        assert!(serialized.size_bytes() > expected.chars().count() as u64);
    }

    #[test]
    fn test_size_measured_after_sanitization() {
        let dirty = Document::delete("a\u{0002}b").with_version(1);
        let clean = Document::delete("ab").with_version(1);
        let dirty = SerializedDocument::from_document(&dirty).unwrap();
        let clean = SerializedDocument::from_document(&clean).unwrap();
        assert_eq!(dirty, clean);
        assert_eq!(dirty.id(), "ab");
    }

    #[test]
    fn test_from_parts_keeps_bytes() {
        let doc = SerializedDocument::from_parts("p1", OperationKind::Add, &b"\"ab\""[..]);
        assert_eq!(doc.size_bytes(), 4);
        assert_eq!(doc.operation(), OperationKind::Add);
    }
}
