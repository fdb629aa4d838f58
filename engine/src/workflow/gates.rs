//! Quality control and sample filter gates
//!
//! Boolean-producing stages. Their booleans are what the controller
//! tracks in the final result tuple; a `false` gate is an expected
//! business failure and propagates as a skip to everything that
//! depends on it.

use crate::config::WorkflowOptions;
use crate::tasks::{FilterTasks, QcTasks};
use crate::workflow::stage::Staged;
use sdk::errors::EngineError;
use sdk::types::{Artifact, SchedulerHints, TaskOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of one QC gate evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct QcVerdict {
    /// Whether the batch passed QC
    pub passed: bool,

    /// The metrics report the QC tool wrote, when it ran
    pub report: Option<Artifact>,
}

impl QcVerdict {
    /// The verdict of a gate whose input never arrived or whose tool
    /// reported failure
    pub fn failed() -> Self {
        Self {
            passed: false,
            report: None,
        }
    }
}

/// Which QC mode to run
#[derive(Debug, Clone)]
pub enum QcMode<'a> {
    /// Pre-filter QC on the collated vendor calls; also computes
    /// gender-inference metrics with the named method.
    Prefilter { gender_method: &'a str },

    /// Post-filter QC on the re-called genotypes, compared against the
    /// normalized intensity artifact.
    Postfilter { sim: &'a Artifact },
}

/// Wraps the external QC task as a pass/fail gate
pub struct QualityControlGate {
    qc: QcTasks,
}

impl QualityControlGate {
    pub fn new(qc: QcTasks) -> Self {
        Self { qc }
    }

    /// Evaluate QC for the given call artifact.
    ///
    /// A skipped input fails the gate without invoking the tool.
    pub async fn evaluate(
        &self,
        db: &Path,
        calls: &Staged<Artifact>,
        output_dir: &Path,
        run_name: &str,
        mode: QcMode<'_>,
        options: &TaskOptions,
        hints: &SchedulerHints,
    ) -> Result<QcVerdict, EngineError> {
        let Staged::Ready(calls) = calls.as_ref() else {
            warn!("QC input missing; gate fails for run '{}'", run_name);
            return Ok(QcVerdict::failed());
        };

        let mode_options = match mode {
            QcMode::Prefilter { gender_method } => TaskOptions::new()
                .with("prefilter", true)
                .with("gender_method", gender_method),
            QcMode::Postfilter { sim } => {
                TaskOptions::new().with("sim", sim.path().to_path_buf())
            }
        };
        let options = options
            .layered(&TaskOptions::new().with("run", run_name))
            .layered(&mode_options);

        let report = self
            .qc
            .quality_control(db, calls, output_dir, &options, hints)
            .await?;

        match report {
            Some(report) => {
                info!("QC passed for run '{}'", run_name);
                Ok(QcVerdict {
                    passed: true,
                    report: Some(report),
                })
            }
            None => {
                warn!("QC failed for run '{}'", run_name);
                Ok(QcVerdict::failed())
            }
        }
    }
}

/// How sample filtering should be applied
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPolicy {
    /// Filtering disabled; the gate trivially passes
    Bypass,

    /// Filter with a caller-supplied threshold configuration
    CustomThresholds(PathBuf),

    /// Filter with the built-in default thresholds; needs the pipeline
    /// database config to resolve them.
    Defaults { db_config: PathBuf },
}

impl FilterPolicy {
    /// Derive the policy from validated run options.
    ///
    /// The two strategies are mutually exclusive; a supplied threshold
    /// configuration always wins over the defaults.
    pub fn from_options(options: &WorkflowOptions) -> Result<Self, EngineError> {
        if options.no_filter {
            return Ok(Self::Bypass);
        }
        if let Some(thresholds) = &options.filter_config {
            return Ok(Self::CustomThresholds(thresholds.clone()));
        }
        match &options.db_config {
            Some(db_config) => Ok(Self::Defaults {
                db_config: db_config.clone(),
            }),
            None => Err(EngineError::InvalidOption {
                key: "filter_config".to_string(),
                reason: "default filter thresholds require the db config option".to_string(),
            }),
        }
    }
}

/// Applies QC-based sample filtering to the pipeline database
pub struct FilterGate {
    filter: FilterTasks,
}

impl FilterGate {
    pub fn new(filter: FilterTasks) -> Self {
        Self { filter }
    }

    /// Apply the filter policy after a QC verdict.
    ///
    /// Returns whether the sample states are in place for the rest of
    /// the run: `false` when QC failed, the bypass verdict when
    /// filtering is disabled, and otherwise whether the filter tool
    /// reported a successful database update.
    pub async fn apply(
        &self,
        qc: &QcVerdict,
        db: &Path,
        policy: &FilterPolicy,
        options: &TaskOptions,
    ) -> Result<bool, EngineError> {
        if !qc.passed {
            return Ok(false);
        }

        let strategy_options = match policy {
            FilterPolicy::Bypass => {
                info!("Sample filtering disabled for this run");
                return Ok(true);
            }
            FilterPolicy::CustomThresholds(thresholds) => {
                TaskOptions::new().with("thresholds", thresholds.clone())
            }
            FilterPolicy::Defaults { db_config } => TaskOptions::new()
                .with("defaults", true)
                .with("config", db_config.clone()),
        };

        let Some(report) = &qc.report else {
            warn!("QC passed but produced no metrics report; filter fails");
            return Ok(false);
        };

        let options = options.layered(&strategy_options);
        let updated = self.filter.filter_samples(report, db, &options).await?;
        if updated.is_none() {
            warn!("Sample filter did not update the pipeline database");
        }
        Ok(updated.is_some())
    }
}
