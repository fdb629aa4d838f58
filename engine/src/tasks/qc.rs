//! Quality control task

use sdk::errors::EngineError;
use sdk::task::{TaskInvoker, TaskRequest};
use sdk::types::{Artifact, SchedulerHints, TaskOptions};
use std::path::Path;
use std::sync::Arc;

/// The external QC tool.
///
/// The tool evaluates recorded quality metrics against thresholds and
/// writes a metrics report under the given output directory. A report
/// artifact on stdout means the batch passed; no artifact means it
/// failed QC.
#[derive(Clone)]
pub struct QcTasks {
    invoker: Arc<dyn TaskInvoker>,
}

impl QcTasks {
    pub fn new(invoker: Arc<dyn TaskInvoker>) -> Self {
        Self { invoker }
    }

    pub async fn quality_control(
        &self,
        db: &Path,
        calls: &Artifact,
        output_dir: &Path,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Option<Artifact>, EngineError> {
        let options =
            options.layered(&TaskOptions::new().with("output_dir", output_dir.to_path_buf()));
        self.invoker
            .invoke(
                TaskRequest::new("genotype_qc")
                    .with_input(Artifact::new(db))
                    .with_input(calls.clone())
                    .with_options(options)
                    .with_hints(hints.clone()),
            )
            .await
    }
}
