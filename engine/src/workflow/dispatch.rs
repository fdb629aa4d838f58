//! Chunk dispatch
//!
//! Fans the per-chromosome calling task out over the planned
//! partitions, waits for every submission, and gates the joined
//! results. The scheduler is free to run the jobs in any order; the
//! dispatcher issues and joins them in planner order, so the flattened
//! result sequence is reproducible run over run.

use crate::tasks::CallingTasks;
use crate::workflow::partition::Partition;
use crate::workflow::stage::Staged;
use futures::future::join_all;
use sdk::errors::EngineError;
use sdk::types::{Artifact, SchedulerHints, TaskOptions};
use std::path::Path;
use tracing::{debug, info, warn};

/// Fan-out/fan-in driver for the partitioned calling phase
pub struct ChunkDispatcher {
    calling: CallingTasks,
    chunk_size: u64,
    group_size: u64,
}

impl ChunkDispatcher {
    pub fn new(calling: CallingTasks, chunk_size: u64, group_size: u64) -> Self {
        Self {
            calling,
            chunk_size,
            group_size,
        }
    }

    /// Dispatch one calling job per partition and join on all of them.
    ///
    /// All-or-nothing: if any partition reports no result, the whole
    /// phase is skipped and completed sibling outputs are discarded.
    /// In-flight siblings are never cancelled; the join simply ignores
    /// what they produced.
    #[allow(clippy::too_many_arguments)]
    pub async fn dispatch(
        &self,
        partitions: &[Partition],
        sim: &Artifact,
        samples: &Artifact,
        manifest: &Path,
        markers: &Artifact,
        run_name: &str,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<Staged<Vec<Artifact>>, EngineError> {
        if partitions.is_empty() {
            debug!("No partitions planned; skipping chunked calling");
            return Ok(Staged::Skipped);
        }

        info!(
            "Dispatching {} calling job(s) for run '{}'",
            partitions.len(),
            run_name
        );

        let common = options.layered(
            &TaskOptions::new()
                .with("size", self.chunk_size)
                .with("group_size", self.group_size)
                .with("markers", markers.path().to_path_buf()),
        );

        let jobs = partitions.iter().map(|partition| {
            // Chunk artifact names embed the chromosome so concurrent
            // jobs never collide in the shared work directory.
            let out_base = format!("{}.{}", run_name, partition.chromosome);
            let chunk_options = common.layered(
                &TaskOptions::new()
                    .with("chromosome", partition.chromosome.clone())
                    .with("start", partition.start)
                    .with("end", partition.end),
            );
            async move {
                self.calling
                    .call_chunk(sim, samples, manifest, &out_base, &chunk_options, hints)
                    .await
            }
        });

        let results = join_all(jobs).await;

        let mut flattened = Vec::new();
        let mut missing = 0usize;
        for (partition, result) in partitions.iter().zip(results) {
            match result? {
                Some(artifacts) => flattened.extend(artifacts),
                None => {
                    warn!(
                        "Calling produced no result for chromosome {}",
                        partition.chromosome
                    );
                    missing += 1;
                }
            }
        }

        if missing > 0 {
            warn!(
                "Discarding {} chunk artifact(s): {} partition(s) failed",
                flattened.len(),
                missing
            );
            return Ok(Staged::Skipped);
        }

        info!("All {} partition(s) produced calls", partitions.len());
        Ok(Staged::Ready(flattened))
    }
}
