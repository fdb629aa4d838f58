//! Genotype calling, merge, and annotation tasks

use sdk::errors::EngineError;
use sdk::task::{TaskInvoker, TaskRequest};
use sdk::types::{Artifact, SchedulerHints, TaskOptions};
use std::path::Path;
use std::sync::Arc;

/// The re-calling tool chain: chunked calls, merge, annotation
#[derive(Clone)]
pub struct CallingTasks {
    invoker: Arc<dyn TaskInvoker>,
}

impl CallingTasks {
    pub fn new(invoker: Arc<dyn TaskInvoker>) -> Self {
        Self { invoker }
    }

    /// Call genotypes for one chromosome-bounded chunk of markers.
    ///
    /// A single submission may split into several sub-jobs, each
    /// reporting its own artifact; the caller gets them all, in the
    /// order the tool reported them.
    pub async fn call_chunk(
        &self,
        sim: &Artifact,
        samples: &Artifact,
        manifest: &Path,
        out_base: &str,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Option<Vec<Artifact>>, EngineError> {
        let options = options.layered(&TaskOptions::new().with("out", out_base));
        self.invoker
            .invoke_grouped(
                TaskRequest::new("call_from_sim")
                    .with_input(sim.clone())
                    .with_input(samples.clone())
                    .with_input(Artifact::new(manifest))
                    .with_options(options)
                    .with_hints(hints.clone()),
            )
            .await
    }

    /// Merge ordered chunk artifacts into one call artifact
    pub async fn merge_bed(
        &self,
        chunks: &[Artifact],
        out_name: &str,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Option<Artifact>, EngineError> {
        let options = options.layered(&TaskOptions::new().with("out", out_name));
        let mut request = TaskRequest::new("merge_bed")
            .with_options(options)
            .with_hints(hints.clone());
        for chunk in chunks {
            request = request.with_input(chunk.clone());
        }
        self.invoker.invoke(request).await
    }

    /// Rewrite the merged artifact's sample and marker annotation from
    /// the collation descriptors.
    pub async fn update_annotation(
        &self,
        calls: &Artifact,
        samples: &Artifact,
        markers: &Artifact,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Option<Artifact>, EngineError> {
        self.invoker
            .invoke(
                TaskRequest::new("update_annotation")
                    .with_input(calls.clone())
                    .with_input(samples.clone())
                    .with_input(markers.clone())
                    .with_options(options.clone())
                    .with_hints(hints.clone()),
            )
            .await
    }
}
