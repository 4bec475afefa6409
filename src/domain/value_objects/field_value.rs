use serde::{Deserialize, Serialize};

use crate::domain::sanitization::sanitize_text;

/// Value of a single index field: one literal or a list of literals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Number of literal values carried
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Single(_) => 1,
            FieldValue::Multi(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strip disallowed characters from every literal
    pub fn sanitized(&self) -> FieldValue {
        match self {
            FieldValue::Single(value) => FieldValue::Single(sanitize_text(value).into_owned()),
            FieldValue::Multi(values) => FieldValue::Multi(
                values
                    .iter()
                    .map(|v| sanitize_text(v).into_owned())
                    .collect(),
            ),
        }
    }

    /// Keep at most `limit` literals, returning how many were dropped
    pub fn truncate(&mut self, limit: usize) -> usize {
        match self {
            FieldValue::Single(_) => 0,
            FieldValue::Multi(values) => {
                let dropped = values.len().saturating_sub(limit);
                values.truncate(limit);
                dropped
            }
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}
