use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

use crate::domain::errors::DomainError;
use crate::domain::sanitization::sanitize_text;
use crate::domain::value_objects::{FieldValue, OperationKind};

/// The service refuses more than this many literals in one field
pub const FIELD_VALUE_LIMIT: usize = 100;

/// Language tag attached to every `add` document
pub const DEFAULT_LANG: &str = "en";

/// Search document as sent to the document service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    operation: OperationKind,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create an `add` document versioned with the current epoch second
    pub fn add(id: impl Into<String>) -> Self {
        Self {
            operation: OperationKind::Add,
            id: id.into(),
            version: Some(Utc::now().timestamp()),
            lang: Some(DEFAULT_LANG.to_string()),
            fields: BTreeMap::new(),
        }
    }

    /// Create a `delete` document versioned with the current epoch second
    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            operation: OperationKind::Delete,
            id: id.into(),
            version: Some(Utc::now().timestamp()),
            lang: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Fill in a missing version, and a missing `lang` on `add` documents
    pub fn with_missing_defaults(mut self, version: i64) -> Self {
        if self.version.is_none() {
            self.version = Some(version);
        }
        if self.operation == OperationKind::Add && self.lang.is_none() {
            self.lang = Some(DEFAULT_LANG.to_string());
        }
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Option<i64> {
        self.version
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Produce the form that is actually serialized.
    ///
    /// Strips disallowed characters everywhere, drops fields from `delete`
    /// documents and caps multi-valued fields at [`FIELD_VALUE_LIMIT`].
    pub fn cleaned(&self) -> Result<Document, DomainError> {
        let id = sanitize_text(&self.id).into_owned();
        if id.is_empty() {
            return Err(DomainError::InvalidDocument(
                "Document id cannot be empty".to_string(),
            ));
        }

        let fields = match self.operation {
            OperationKind::Delete => BTreeMap::new(),
            OperationKind::Add => self
                .fields
                .iter()
                .map(|(name, value)| {
                    let mut value = value.sanitized();
                    let dropped = value.truncate(FIELD_VALUE_LIMIT);
                    if dropped > 0 {
                        error!(
                            document_id = %id,
                            field = %name,
                            dropped,
                            "Had to leave values out of search document due to field value limit"
                        );
                    }
                    (sanitize_text(name).into_owned(), value)
                })
                .collect(),
        };

        Ok(Document {
            operation: self.operation,
            id,
            version: self.version,
            lang: self.lang.as_deref().map(|l| sanitize_text(l).into_owned()),
            fields,
        })
    }
}
