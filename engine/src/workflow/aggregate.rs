//! Result aggregation
//!
//! Fan-in side of the chunked calling phase: merge the ordered chunk
//! artifacts into one call artifact, then decorate it with the
//! per-sample and per-marker descriptors.

use crate::tasks::CallingTasks;
use crate::workflow::stage::Staged;
use sdk::errors::EngineError;
use sdk::types::{Artifact, SchedulerHints, TaskOptions};
use tracing::{debug, info};

/// Merges and annotates chunked call outputs
pub struct ResultAggregator {
    calling: CallingTasks,
}

impl ResultAggregator {
    pub fn new(calling: CallingTasks) -> Self {
        Self { calling }
    }

    /// Merge ordered chunk artifacts into one call artifact.
    ///
    /// Chunk order is passed through to the merge tool untouched; the
    /// merged artifact is only correct if it preserves the boundary
    /// descriptor's order. A skipped chunk phase, or one that somehow
    /// arrived empty, skips the merge: there is no such thing as a
    /// merge of zero chunks.
    pub async fn merge(
        &self,
        chunks: Staged<Vec<Artifact>>,
        out_name: &str,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Staged<Artifact>, EngineError> {
        chunks
            .and_then_stage(|chunks| async move {
                if chunks.is_empty() {
                    debug!("No chunk artifacts to merge");
                    return Ok(Staged::Skipped);
                }
                info!("Merging {} chunk artifact(s) into {}", chunks.len(), out_name);
                let merged = self
                    .calling
                    .merge_bed(&chunks, out_name, options, hints)
                    .await?;
                Ok(Staged::from_option(merged))
            })
            .await
    }

    /// Decorate the merged artifact with the per-sample and per-marker
    /// descriptors. Both descriptors must be present, even when the
    /// merge itself succeeded.
    pub async fn annotate(
        &self,
        merged: &Staged<Artifact>,
        samples: &Staged<Artifact>,
        markers: &Staged<Artifact>,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Staged<Artifact>, EngineError> {
        let inputs = merged
            .as_ref()
            .zip(samples.as_ref())
            .zip(markers.as_ref());

        inputs
            .and_then_stage(|((calls, samples), markers)| async move {
                let annotated = self
                    .calling
                    .update_annotation(calls, samples, markers, options, hints)
                    .await?;
                Ok(Staged::from_option(annotated))
            })
            .await
    }
}
