mod delete_documents;
mod upload_documents;

pub use delete_documents::DeleteDocumentsUseCase;
pub use upload_documents::{BulkUploadUseCase, CONTENT_TYPE_JSON, STATUS_TRANSPORT_ERROR};
