//! Sample and manifest metadata tasks
//!
//! These tools read the pipeline database and the chip manifest; they
//! run quickly and locally, so no scheduler hints are attached.

use sdk::errors::EngineError;
use sdk::task::{TaskInvoker, TaskRequest};
use sdk::types::{Artifact, TaskOptions};
use std::path::Path;
use std::sync::Arc;

/// Metadata collation and manifest parsing
#[derive(Clone)]
pub struct MetadataTasks {
    invoker: Arc<dyn TaskInvoker>,
}

impl MetadataTasks {
    pub fn new(invoker: Arc<dyn TaskInvoker>) -> Self {
        Self { invoker }
    }

    /// Collate per-sample intensity and call references for a run into
    /// one JSON artifact.
    pub async fn sample_intensities(
        &self,
        db: &Path,
        run_name: &str,
        out_name: &str,
        options: &TaskOptions,
    ) -> Result<Option<Artifact>, EngineError> {
        let options = options
            .layered(&TaskOptions::new().with("run", run_name).with("out", out_name));
        self.invoker
            .invoke(
                TaskRequest::new("sample_intensities")
                    .with_input(Artifact::new(db))
                    .with_options(options),
            )
            .await
    }

    /// Parse the chip manifest into a marker-annotation artifact and a
    /// chromosome boundary artifact, in that order.
    pub async fn parse_manifest(
        &self,
        manifest: &Path,
        markers_name: &str,
        bounds_name: &str,
        options: &TaskOptions,
    ) -> Result<Option<(Artifact, Artifact)>, EngineError> {
        let options = options.layered(
            &TaskOptions::new()
                .with("markers", markers_name)
                .with("bounds", bounds_name),
        );
        let artifacts = self
            .invoker
            .invoke_grouped(
                TaskRequest::new("parse_manifest")
                    .with_input(Artifact::new(manifest))
                    .with_options(options),
            )
            .await?;

        match artifacts {
            None => Ok(None),
            Some(mut artifacts) if artifacts.len() == 2 => {
                let bounds = artifacts.pop().expect("length checked");
                let markers = artifacts.pop().expect("length checked");
                Ok(Some((markers, bounds)))
            }
            Some(artifacts) => Err(EngineError::MalformedArtifact {
                task: "parse_manifest".to_string(),
                reason: format!("expected 2 artifacts, tool reported {}", artifacts.len()),
            }),
        }
    }
}
