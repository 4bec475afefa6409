use parking_lot::Mutex;
use std::collections::HashMap;

use crate::application::ports::BatchOutcomeReporter;

/// One reported batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcomeRecord {
    pub document_ids: Vec<String>,
    pub status: String,
}

/// Collects outcomes in memory for callers that inspect them after a run
#[derive(Debug, Default)]
pub struct InMemoryOutcomeRecorder {
    outcomes: Mutex<Vec<BatchOutcomeRecord>>,
}

impl InMemoryOutcomeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<BatchOutcomeRecord> {
        self.outcomes.lock().clone()
    }

    /// Latest status reported for a document
    pub fn status_of(&self, document_id: &str) -> Option<String> {
        self.outcomes
            .lock()
            .iter()
            .rev()
            .find(|record| record.document_ids.iter().any(|id| id == document_id))
            .map(|record| record.status.clone())
    }

    /// Number of documents per reported status
    pub fn document_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for record in self.outcomes.lock().iter() {
            *counts.entry(record.status.clone()).or_insert(0) += record.document_ids.len();
        }
        counts
    }

    /// Hand over everything recorded so far and start empty
    pub fn take(&self) -> Vec<BatchOutcomeRecord> {
        std::mem::take(&mut *self.outcomes.lock())
    }
}

impl BatchOutcomeReporter for InMemoryOutcomeRecorder {
    fn report_batch_outcome(&self, document_ids: &[String], status: &str) {
        self.outcomes.lock().push(BatchOutcomeRecord {
            document_ids: document_ids.to_vec(),
            status: status.to_string(),
        });
    }
}
