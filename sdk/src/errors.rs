//! Error types and handling
//!
//! This module provides the error types used throughout the Genoflow
//! engine. All errors implement the `GenoflowErrorExt` trait which
//! provides user-friendly hints and indicates whether errors are
//! recoverable.
//!
//! Errors here are reserved for unexpected faults. A tool that runs but
//! produces no usable result is not an error; that outcome travels as
//! `None` through the task-invocation interface and as a skip through
//! the workflow stages.

use thiserror::Error;

/// Trait for Genoflow error extensions
///
/// This trait provides additional context for errors, including
/// user-friendly hints and recoverability information.
pub trait GenoflowErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by resubmitting the run.
    /// Non-recoverable errors typically require fixing the run
    /// definition or the deployment first.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// This enum represents all unexpected faults that can occur while
/// orchestrating a pipeline run. Expected business failures (a stage
/// produced nothing usable) never appear here.
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration / options
/// - **Database**: Pipeline database operation failures
/// - **Submission**: Batch scheduler submission failures
/// - **Artifact**: Malformed collaborator output (e.g. boundary JSON)
/// - **File System**: I/O failures during run setup
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    // Pipeline database errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found in pipeline database: {0}")]
    RunNotFound(String),

    // Scheduler submission errors
    #[error("Job submission failed for task '{task}': {reason}")]
    Submission { task: String, reason: String },

    #[error("Tool not found on the analysis path: {0}")]
    ToolNotFound(String),

    // Collaborator output errors
    #[error("Malformed artifact from task '{task}': {reason}")]
    MalformedArtifact { task: String, reason: String },

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenoflowErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your genoflow.toml file for errors",
            Self::InvalidOption { .. } => "Check the run options passed on the command line",

            Self::Database(_) => "Pipeline database operation failed. Check the database file",
            Self::RunNotFound(_) => "The named run is not defined in the pipeline database",

            Self::Submission { .. } => "Job submission failed. Check the scheduler is reachable",
            Self::ToolNotFound(_) => "An analysis tool is missing from the configured tool path",

            Self::MalformedArtifact { .. } => {
                "A tool produced output the engine could not read. Check the tool logs"
            }

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Fixing these requires changing the run definition or the
            // deployment, not resubmitting.
            Self::Config(_) | Self::InvalidOption { .. } | Self::RunNotFound(_)
            | Self::ToolNotFound(_) => false,

            // All other errors are potentially transient
            _ => true,
        }
    }
}
