//! Task invocation trait and request types
//!
//! This module defines the seam between the workflow engine and the
//! external analysis tools. The engine only ever talks to tools through
//! [`TaskInvoker`]; scheduler adapters implement it and are responsible
//! for submitting the job, waiting for completion, and reporting the
//! produced artifact.

use crate::errors::EngineError;
use crate::types::{Artifact, SchedulerHints, TaskOptions};
use async_trait::async_trait;

/// One task invocation: a tool name, its input artifacts, the layered
/// option map, and the scheduler hints for the submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    /// Name of the external tool to invoke
    pub name: String,

    /// Input artifacts consumed by the tool, in positional order
    pub inputs: Vec<Artifact>,

    /// Layered key/value options for the tool
    pub options: TaskOptions,

    /// Resource hints for the batch scheduler
    pub hints: SchedulerHints,
}

impl TaskRequest {
    /// Create a request for the named tool with no inputs or options
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            options: TaskOptions::new(),
            hints: SchedulerHints::new(),
        }
    }

    /// Append an input artifact
    pub fn with_input(mut self, input: Artifact) -> Self {
        self.inputs.push(input);
        self
    }

    /// Replace the option map
    pub fn with_options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the scheduler hints
    pub fn with_hints(mut self, hints: SchedulerHints) -> Self {
        self.hints = hints;
        self
    }
}

/// Uniform interface for calling one external analysis tool.
///
/// From the engine's perspective an invocation is a blocking call: the
/// future resolves only once the scheduled job has reported completion,
/// however the scheduler chooses to run it.
///
/// `Ok(None)` means the tool ran but produced no usable result — an
/// expected business failure that downstream stages must treat as a
/// skip signal. `Err` is reserved for unexpected faults (submission
/// failure, I/O) and propagates to the workflow caller; the engine
/// never retries.
#[async_trait]
pub trait TaskInvoker: Send + Sync {
    /// Invoke a tool expected to produce at most one artifact
    async fn invoke(&self, request: TaskRequest) -> Result<Option<Artifact>, EngineError>;

    /// Invoke a tool whose single submission may fan out into several
    /// sub-jobs, each producing its own artifact.
    ///
    /// The default implementation wraps [`invoke`](Self::invoke) in a
    /// one-element vector; adapters for group-splitting tools override
    /// it.
    async fn invoke_grouped(
        &self,
        request: TaskRequest,
    ) -> Result<Option<Vec<Artifact>>, EngineError> {
        Ok(self.invoke(request).await?.map(|artifact| vec![artifact]))
    }
}
