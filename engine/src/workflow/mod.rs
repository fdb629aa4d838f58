//! Workflow orchestration
//!
//! Drives the full batch genotyping stage sequence: collate vendor
//! calls, convert formats, pre-filter QC, sample filtering, re-collate
//! the filtered batch, parse the manifest, fan the calling task out
//! over chromosome partitions, merge, annotate, and post-filter QC.
//!
//! The controller owns no tool logic. Every external call goes through
//! the capability wrappers it was constructed with, and every stage
//! declares its outcome as [`Staged`]: skipped stages yield `Skipped`
//! without aborting the run, so later stages with intact inputs still
//! evaluate.

pub mod aggregate;
pub mod dispatch;
pub mod gates;
pub mod partition;
pub mod stage;

pub use aggregate::ResultAggregator;
pub use dispatch::ChunkDispatcher;
pub use gates::{FilterGate, FilterPolicy, QcMode, QcVerdict, QualityControlGate};
pub use partition::{ChromosomeBounds, Partition, PartitionPlanner};
pub use stage::Staged;

use crate::config::WorkflowOptions;
use crate::tasks::{CallingTasks, FilterTasks, FormatTasks, MetadataTasks, QcTasks};
use sdk::errors::EngineError;
use sdk::task::TaskInvoker;
use sdk::types::{Artifact, TaskOptions};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// One named execution of the pipeline over one sample batch.
///
/// Created once per invocation and immutable for the run's duration.
/// All stages and all chunk jobs share the one work directory and the
/// one log directory.
#[derive(Debug, Clone)]
pub struct RunContext {
    name: String,
    work_dir: PathBuf,
    log_dir: PathBuf,
}

impl RunContext {
    /// Set up the run: create the work and log directories if absent
    /// and record the engine version in the run log.
    pub fn prepare(name: &str, work_dir: &Path) -> Result<Self, EngineError> {
        let log_dir = work_dir.join("log");
        fs::create_dir_all(work_dir)?;
        fs::create_dir_all(&log_dir)?;

        let mut version_log = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("version.log"))?;
        writeln!(
            version_log,
            "genoflow {} started run '{}' at {}",
            env!("CARGO_PKG_VERSION"),
            name,
            chrono::Utc::now().to_rfc3339()
        )?;

        Ok(Self {
            name: name.to_string(),
            work_dir: work_dir.to_path_buf(),
            log_dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Base options shared by every task call in the run
    pub fn base_options(&self) -> TaskOptions {
        TaskOptions::new()
            .with("work_dir", self.work_dir.clone())
            .with("log_dir", self.log_dir.clone())
    }

    /// Run-scoped artifact name: `<run>.<suffix>`
    pub fn artifact_name(&self, suffix: &str) -> String {
        format!("{}.{}", self.name, suffix)
    }
}

/// Final result tuple of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// Collated vendor calls, marker-major orientation
    pub collated: Artifact,

    /// Merged, annotated re-called genotypes
    pub calls: Artifact,

    /// Pre-filter QC verdict on the vendor calls
    pub prefilter_qc: bool,

    /// Post-filter QC verdict on the re-called genotypes
    pub postfilter_qc: bool,
}

/// The batch genotyping workflow controller.
///
/// Holds its capability collaborators, all sharing one task invoker
/// passed in at construction.
pub struct Workflow {
    metadata: MetadataTasks,
    format: FormatTasks,
    calling: CallingTasks,
    aggregator: ResultAggregator,
    qc_gate: QualityControlGate,
    filter_gate: FilterGate,
}

impl Workflow {
    /// Compose a workflow around the given task invoker
    pub fn new(invoker: Arc<dyn TaskInvoker>) -> Self {
        let calling = CallingTasks::new(Arc::clone(&invoker));
        Self {
            metadata: MetadataTasks::new(Arc::clone(&invoker)),
            format: FormatTasks::new(Arc::clone(&invoker)),
            aggregator: ResultAggregator::new(calling.clone()),
            qc_gate: QualityControlGate::new(QcTasks::new(Arc::clone(&invoker))),
            filter_gate: FilterGate::new(FilterTasks::new(Arc::clone(&invoker))),
            calling,
        }
    }

    /// Run the workflow for one named batch.
    ///
    /// Returns the result tuple only when every tracked member is
    /// present; any expected business failure along the way yields
    /// `Ok(None)`. Unexpected faults propagate as errors without any
    /// retry.
    pub async fn run(
        &self,
        db: &Path,
        run_name: &str,
        work_dir: &Path,
        options: &WorkflowOptions,
    ) -> Result<Option<WorkflowResult>, EngineError> {
        options.validate()?;
        let policy = FilterPolicy::from_options(options)?;

        let ctx = RunContext::prepare(run_name, work_dir)?;
        let hints = options.scheduler_hints();
        let base = ctx.base_options();
        let manifest = options.manifest.as_path();

        // Collate vendor calls for the unfiltered batch
        info!("Collating vendor calls for run '{}'", run_name);
        let vendor_samples = Staged::from_option(
            self.metadata
                .sample_intensities(db, run_name, &ctx.artifact_name("gencall.sample.json"), &base)
                .await?,
        );

        // Convert to the analysis format, both orientations
        let imajor = match vendor_samples.as_ref() {
            Staged::Ready(samples) => Staged::from_option(
                self.format
                    .gtc_to_bed(
                        samples,
                        manifest,
                        &ctx.artifact_name("gencall.imajor.bed"),
                        &base,
                        &hints,
                    )
                    .await?,
            ),
            Staged::Skipped => Staged::Skipped,
        };

        let collated = match imajor.as_ref() {
            Staged::Ready(bed) => Staged::from_option(
                self.format
                    .transpose_bed(bed, &ctx.artifact_name("gencall.smajor.bed"), &base, &hints)
                    .await?,
            ),
            Staged::Skipped => Staged::Skipped,
        };

        // Pre-filter QC on the vendor calls
        let prefilter = self
            .qc_gate
            .evaluate(
                db,
                &collated,
                &ctx.work_dir().join("gencall_qc"),
                run_name,
                QcMode::Prefilter {
                    gender_method: &options.gender_method,
                },
                &base,
                &hints,
            )
            .await?;

        // Apply sample filtering to the pipeline database
        let filtered = self.filter_gate.apply(&prefilter, db, &policy, &base).await?;

        // Re-collate the filtered batch and write normalized intensities
        let mut recollate_options = base.clone();
        recollate_options.set("gender_method", options.gender_method.clone());
        if let Some(db_config) = &options.db_config {
            recollate_options.set("config", db_config.clone());
        }

        let samples = if filtered {
            info!("Re-collating filtered batch for run '{}'", run_name);
            Staged::from_option(
                self.metadata
                    .sample_intensities(
                        db,
                        run_name,
                        &ctx.artifact_name("sample.json"),
                        &recollate_options,
                    )
                    .await?,
            )
        } else {
            Staged::Skipped
        };

        let sim = match samples.as_ref() {
            Staged::Ready(samples) => Staged::from_option(
                self.format
                    .gtc_to_sim(samples, manifest, &ctx.artifact_name("sim"), true, &base, &hints)
                    .await?,
            ),
            Staged::Skipped => Staged::Skipped,
        };

        // Parse the manifest into marker annotation and chromosome bounds
        let (markers, bounds) = if filtered {
            match self
                .metadata
                .parse_manifest(
                    manifest,
                    &ctx.artifact_name("snp.json"),
                    &ctx.artifact_name("chr.json"),
                    &base,
                )
                .await?
            {
                Some((markers, bounds)) => (Staged::Ready(markers), Staged::Ready(bounds)),
                None => (Staged::Skipped, Staged::Skipped),
            }
        } else {
            (Staged::Skipped, Staged::Skipped)
        };

        // Plan partitions from the boundary descriptor
        let partitions = match bounds.as_ref() {
            Staged::Ready(bounds) => {
                let records = PartitionPlanner::load_bounds(bounds)?;
                PartitionPlanner::plan(Some(&records))
            }
            Staged::Skipped => Vec::new(),
        };

        // Fan the calling task out over the partitions
        let dispatcher =
            ChunkDispatcher::new(self.calling.clone(), options.chunk_size, options.group_size);
        let chunks = sim
            .as_ref()
            .zip(samples.as_ref())
            .zip(markers.as_ref())
            .and_then_stage(|((sim, samples), markers)| {
                dispatcher.dispatch(
                    &partitions, sim, samples, manifest, markers, run_name, &base, &hints,
                )
            })
            .await?;

        // Merge and annotate the chunked calls
        let merged = self
            .aggregator
            .merge(chunks, &ctx.artifact_name("calls.bed"), &base, &hints)
            .await?;
        let calls = self
            .aggregator
            .annotate(&merged, &samples, &markers, &base, &hints)
            .await?;

        // Post-filter QC on the re-called genotypes
        let postfilter = match sim.as_ref().ready() {
            Some(sim) => {
                self.qc_gate
                    .evaluate(
                        db,
                        &calls,
                        &ctx.work_dir().join("calls_qc"),
                        run_name,
                        QcMode::Postfilter { sim },
                        &base,
                        &hints,
                    )
                    .await?
            }
            None => QcVerdict::failed(),
        };

        // The run succeeds only when every tracked member is present
        let result = match (collated.ready(), calls.ready()) {
            (Some(collated), Some(calls)) if prefilter.passed && postfilter.passed => {
                info!("Run '{}' completed", run_name);
                Some(WorkflowResult {
                    collated,
                    calls,
                    prefilter_qc: prefilter.passed,
                    postfilter_qc: postfilter.passed,
                })
            }
            _ => {
                info!("Run '{}' did not complete; no result tuple", run_name);
                None
            }
        };
        Ok(result)
    }
}
