//! CLI interface for Genoflow
//!
//! This module provides the command-line interface using clap's derive
//! API. It defines all commands and global flags for driving pipeline
//! runs.

use crate::config::{
    WorkflowOptions, DEFAULT_CHUNK_SIZE, DEFAULT_GENDER_METHOD, DEFAULT_GROUP_SIZE,
    DEFAULT_MEMORY_MB,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Genoflow batch genotyping workflow engine
///
/// Orchestrates multi-stage genotyping analysis runs: collation, format
/// conversion, QC gating, sample filtering, chunked re-calling, and
/// merge, with every analysis tool dispatched through the batch
/// scheduler.
#[derive(Parser, Debug)]
#[command(name = "genoflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the genotyping workflow for one batch
    Run(RunArgs),

    /// Check the engine configuration and tool deployment
    Check {
        /// Pipeline database to verify, if any
        db: Option<PathBuf>,
    },
}

/// Arguments for one workflow run
#[derive(Args, Debug)]
pub struct RunArgs {
    /// SQLite pipeline database file
    pub db: PathBuf,

    /// Name of a run defined in the pipeline database
    pub run_name: String,

    /// Working directory for run artifacts, an absolute path
    pub work_dir: PathBuf,

    /// Chip manifest file
    #[arg(long)]
    pub manifest: PathBuf,

    /// Custom pipeline database config used for re-collation
    #[arg(long, value_name = "PATH")]
    pub db_config: Option<PathBuf>,

    /// Scheduler queue hint
    #[arg(long)]
    pub queue: Option<String>,

    /// Memory to request per job, in MB
    #[arg(long, default_value_t = DEFAULT_MEMORY_MB)]
    pub memory: u64,

    /// Scheduler node-selector hint
    #[arg(long)]
    pub select: Option<String>,

    /// Markers analysed by a single calling job
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,

    /// Calling jobs grouped into one scheduler submission
    #[arg(long, default_value_t = DEFAULT_GROUP_SIZE)]
    pub group_size: u64,

    /// Gender determination method name
    #[arg(long, default_value = DEFAULT_GENDER_METHOD)]
    pub gender_method: String,

    /// Custom sample filter threshold file
    #[arg(long, value_name = "PATH")]
    pub filter_config: Option<PathBuf>,

    /// Skip sample filtering entirely
    #[arg(long)]
    pub no_filter: bool,
}

impl RunArgs {
    /// Fold the command-line arguments into typed workflow options
    pub fn to_options(&self) -> WorkflowOptions {
        let mut options = WorkflowOptions::new(self.manifest.clone());
        options.db_config = self.db_config.clone();
        options.queue = self.queue.clone();
        options.memory_mb = self.memory;
        options.select = self.select.clone();
        options.chunk_size = self.chunk_size;
        options.group_size = self.group_size;
        options.gender_method = self.gender_method.clone();
        options.filter_config = self.filter_config.clone();
        options.no_filter = self.no_filter;
        options
    }
}
