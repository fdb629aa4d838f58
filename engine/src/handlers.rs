//! Command handlers
//!
//! Glue between the CLI and the engine: build the invoker from config,
//! validate the run against the pipeline database, drive the workflow,
//! and report the outcome.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::db::PipelineDb;
use crate::invoker::BatchInvoker;
use crate::workflow::Workflow;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Tools the engine dispatches; `check` verifies the deployment carries
/// all of them.
const REQUIRED_TOOLS: &[&str] = &[
    "sample_intensities",
    "parse_manifest",
    "gtc_to_bed",
    "transpose_bed",
    "gtc_to_sim",
    "call_from_sim",
    "merge_bed",
    "update_annotation",
    "genotype_qc",
    "filter_samples",
];

/// Execute one workflow run. Returns whether the run completed with a
/// full result tuple.
pub async fn handle_run(args: RunArgs, config: &Config) -> Result<bool> {
    let mut options = args.to_options();
    if options.queue.is_none() {
        options.queue = config.scheduler.default_queue.clone();
    }

    let db = PipelineDb::open(&args.db).await?;
    if !db.run_exists(&args.run_name).await? {
        anyhow::bail!(
            "Run '{}' is not defined in {}",
            args.run_name,
            args.db.display()
        );
    }
    let samples = db.sample_count(&args.run_name).await?;
    info!("Run '{}' has {} sample(s)", args.run_name, samples);
    db.close().await;

    let invoker = BatchInvoker::new(&config.tools.path, config.scheduler.submit.clone());
    let workflow = Workflow::new(Arc::new(invoker));

    let result = workflow
        .run(&args.db, &args.run_name, &args.work_dir, &options)
        .await
        .context("Workflow run failed")?;

    match result {
        Some(result) => {
            println!("Run '{}' completed.", args.run_name);
            println!("  collated calls: {}", result.collated.path().display());
            println!("  merged calls:   {}", result.calls.path().display());
            println!("  prefilter QC:   passed");
            println!("  postfilter QC:  passed");
            Ok(true)
        }
        None => {
            println!(
                "Run '{}' did not complete; an upstream stage produced no usable result.",
                args.run_name
            );
            println!("Check the run log directory for the failing tool's output.");
            Ok(false)
        }
    }
}

/// Verify the tool deployment and, optionally, a pipeline database
pub async fn handle_check(db: Option<PathBuf>, config: &Config) -> Result<()> {
    println!("Tool path: {}", config.tools.path.display());
    if !config.tools.path.is_dir() {
        anyhow::bail!("Tool path is not a directory");
    }

    let mut missing = 0;
    for tool in REQUIRED_TOOLS {
        let present = config.tools.path.join(tool).exists();
        println!("  {:<20} {}", tool, if present { "ok" } else { "MISSING" });
        if !present {
            missing += 1;
        }
    }

    match &config.scheduler.submit {
        Some(submit) => println!("Scheduler submit wrapper: {}", submit),
        None => println!("Scheduler submit wrapper: none (jobs run directly)"),
    }

    if let Some(db_path) = db {
        let db = PipelineDb::open(&db_path).await?;
        println!("Pipeline database opened: {}", db_path.display());
        db.close().await;
    }

    if missing > 0 {
        anyhow::bail!("{} required tool(s) missing", missing);
    }
    println!("Deployment looks complete.");
    Ok(())
}
