mod in_memory_outcome_recorder;
mod tracing_outcome_reporter;

pub use in_memory_outcome_recorder::{BatchOutcomeRecord, InMemoryOutcomeRecorder};
pub use tracing_outcome_reporter::TracingOutcomeReporter;
