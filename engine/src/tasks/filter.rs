//! Sample filter task
//!
//! The filter tool reads a QC metrics report and updates sample
//! inclusion state in the pipeline database. It runs locally against
//! the database file, so no scheduler hints are attached.

use sdk::errors::EngineError;
use sdk::task::{TaskInvoker, TaskRequest};
use sdk::types::{Artifact, TaskOptions};
use std::path::Path;
use std::sync::Arc;

/// Sample inclusion filtering against the pipeline database
#[derive(Clone)]
pub struct FilterTasks {
    invoker: Arc<dyn TaskInvoker>,
}

impl FilterTasks {
    pub fn new(invoker: Arc<dyn TaskInvoker>) -> Self {
        Self { invoker }
    }

    /// Apply QC-based sample filtering.
    ///
    /// The returned artifact is the tool's record of the applied update;
    /// its presence is what matters to the workflow, which only needs to
    /// know whether the sample states were written.
    pub async fn filter_samples(
        &self,
        qc_results: &Artifact,
        db: &Path,
        options: &TaskOptions,
    ) -> Result<Option<Artifact>, EngineError> {
        self.invoker
            .invoke(
                TaskRequest::new("filter_samples")
                    .with_input(qc_results.clone())
                    .with_input(Artifact::new(db))
                    .with_options(options.clone()),
            )
            .await
    }
}
