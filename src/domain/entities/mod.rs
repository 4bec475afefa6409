mod document;
mod serialized_document;

pub use document::{Document, DEFAULT_LANG, FIELD_VALUE_LIMIT};
pub use serialized_document::SerializedDocument;
