use std::sync::Arc;

use crate::application::batching::DocumentBatchBuilder;
use crate::application::errors::BatchingError;
use crate::application::ports::SpoolProvider;
use crate::domain::value_objects::BatchLimits;

/// Factory for fresh builders sharing one set of limits
pub trait BuilderProvider: Send + Sync {
    fn new_builder(&self) -> Result<DocumentBatchBuilder, BatchingError>;

    fn limits(&self) -> BatchLimits;
}

/// Builder provider backed by a [`SpoolProvider`]
#[derive(Clone)]
pub struct SpooledBuilderProvider {
    limits: BatchLimits,
    spools: Arc<dyn SpoolProvider>,
}

impl SpooledBuilderProvider {
    pub fn new(limits: BatchLimits, spools: Arc<dyn SpoolProvider>) -> Self {
        Self { limits, spools }
    }
}

impl BuilderProvider for SpooledBuilderProvider {
    fn new_builder(&self) -> Result<DocumentBatchBuilder, BatchingError> {
        let spool = self.spools.create()?;
        DocumentBatchBuilder::new(self.limits, spool)
    }

    fn limits(&self) -> BatchLimits {
        self.limits
    }
}

impl std::fmt::Debug for SpooledBuilderProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpooledBuilderProvider")
            .field("limits", &self.limits)
            .field("spool_kind", &self.spools.kind())
            .finish()
    }
}
