//! Format conversion tasks

use sdk::errors::EngineError;
use sdk::task::{TaskInvoker, TaskRequest};
use sdk::types::{Artifact, SchedulerHints, TaskOptions};
use std::path::Path;
use std::sync::Arc;

/// Conversions between the vendor call format and the analysis formats
#[derive(Clone)]
pub struct FormatTasks {
    invoker: Arc<dyn TaskInvoker>,
}

impl FormatTasks {
    pub fn new(invoker: Arc<dyn TaskInvoker>) -> Self {
        Self { invoker }
    }

    /// Convert collated vendor calls to an individual-major binary
    /// genotype matrix.
    pub async fn gtc_to_bed(
        &self,
        samples: &Artifact,
        manifest: &Path,
        out_name: &str,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Option<Artifact>, EngineError> {
        let options = options.layered(&TaskOptions::new().with("out", out_name));
        self.invoker
            .invoke(
                TaskRequest::new("gtc_to_bed")
                    .with_input(samples.clone())
                    .with_input(Artifact::new(manifest))
                    .with_options(options)
                    .with_hints(hints.clone()),
            )
            .await
    }

    /// Transpose a genotype matrix to marker-major orientation
    pub async fn transpose_bed(
        &self,
        bed: &Artifact,
        out_name: &str,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Option<Artifact>, EngineError> {
        let options = options.layered(&TaskOptions::new().with("out", out_name));
        self.invoker
            .invoke(
                TaskRequest::new("transpose_bed")
                    .with_input(bed.clone())
                    .with_options(options)
                    .with_hints(hints.clone()),
            )
            .await
    }

    /// Write normalized intensities for the collated samples into a
    /// single SIM artifact.
    pub async fn gtc_to_sim(
        &self,
        samples: &Artifact,
        manifest: &Path,
        out_name: &str,
        normalize: bool,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Option<Artifact>, EngineError> {
        let options = options.layered(
            &TaskOptions::new()
                .with("out", out_name)
                .with("normalize", normalize),
        );
        self.invoker
            .invoke(
                TaskRequest::new("gtc_to_sim")
                    .with_input(samples.clone())
                    .with_input(Artifact::new(manifest))
                    .with_options(options)
                    .with_hints(hints.clone()),
            )
            .await
    }
}
