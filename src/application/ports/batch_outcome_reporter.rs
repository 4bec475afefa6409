#[cfg(test)]
use mockall::automock;

/// Port for recording how each uploaded batch went, per document
#[cfg_attr(test, automock)]
pub trait BatchOutcomeReporter: Send + Sync {
    fn report_batch_outcome(&self, document_ids: &[String], status: &str);
}
