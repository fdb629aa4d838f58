//! Batch scheduler task invoker
//!
//! Production implementation of the `TaskInvoker` seam. Each invocation
//! becomes one subprocess: either the analysis tool itself, or the
//! configured scheduler submission wrapper with the tool command
//! appended. The wrapper is expected to block until the job completes
//! (the engine treats every invocation as synchronous); retry policy,
//! if any, lives in the scheduler, never here.
//!
//! The analysis tool search path is an explicit constructor parameter.
//! Nothing here mutates process-wide environment.
//!
//! Tool output contract: a tool prints the path of each artifact it
//! produced on its own stdout line and exits 0. No lines means the tool
//! ran but produced no usable result. A non-zero exit is an unexpected
//! fault and surfaces as an error.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::task::{TaskInvoker, TaskRequest};
use sdk::types::{Artifact, OptionValue, SchedulerHints};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Invokes analysis tools through the batch scheduler
pub struct BatchInvoker {
    /// Directory containing the analysis tool executables
    tool_path: PathBuf,

    /// Scheduler submission wrapper; tools run directly when unset
    submit: Option<String>,
}

impl BatchInvoker {
    /// Create an invoker resolving tools under `tool_path`.
    ///
    /// `submit` names the blocking scheduler submission wrapper
    /// (e.g. "bsub"); pass `None` to run tools directly, which is what
    /// single-host deployments and the test harness use.
    pub fn new(tool_path: impl Into<PathBuf>, submit: Option<String>) -> Self {
        Self {
            tool_path: tool_path.into(),
            submit,
        }
    }

    /// Resolve a tool name against the configured search path
    async fn resolve_tool(&self, name: &str) -> Result<PathBuf, EngineError> {
        let tool = self.tool_path.join(name);
        let exists = tokio::fs::try_exists(&tool).await.unwrap_or(false);
        if !exists {
            return Err(EngineError::ToolNotFound(name.to_string()));
        }
        Ok(tool)
    }

    /// Build the full command line for one request
    fn build_command(&self, tool: &Path, request: &TaskRequest, job_id: &Uuid) -> Command {
        let mut command = match &self.submit {
            Some(submit) => {
                let mut cmd = Command::new(submit);
                cmd.arg("-J").arg(format!("{}.{}", request.name, job_id));
                append_hints(&mut cmd, &request.hints);
                cmd.arg(tool);
                cmd
            }
            None => Command::new(tool),
        };

        for input in &request.inputs {
            command.arg(input.path());
        }
        for (key, value) in request.options.iter() {
            match value {
                OptionValue::Bool(true) => {
                    command.arg(format!("--{}", key));
                }
                OptionValue::Bool(false) => {}
                OptionValue::Str(s) => {
                    command.arg(format!("--{}", key)).arg(s);
                }
                OptionValue::Int(i) => {
                    command.arg(format!("--{}", key)).arg(i.to_string());
                }
                OptionValue::Path(p) => {
                    command.arg(format!("--{}", key)).arg(p);
                }
            }
        }

        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command
    }

    /// Run one request to completion and collect the artifact paths it
    /// reported on stdout.
    async fn run(&self, request: TaskRequest) -> Result<Vec<Artifact>, EngineError> {
        let tool = self.resolve_tool(&request.name).await?;
        let job_id = Uuid::new_v4();
        info!("Submitting task '{}' (job {})", request.name, job_id);

        let output = self
            .build_command(&tool, &request, &job_id)
            .output()
            .await
            .map_err(|e| EngineError::Submission {
                task: request.name.clone(),
                reason: format!("failed to start: {}", e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(
                "Task '{}' (job {}) failed with {}",
                request.name, job_id, output.status
            );
            return Err(EngineError::Submission {
                task: request.name,
                reason: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let artifacts: Vec<Artifact> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Artifact::new)
            .collect();

        debug!(
            "Task '{}' (job {}) completed with {} artifact(s)",
            request.name,
            job_id,
            artifacts.len()
        );
        Ok(artifacts)
    }
}

/// Translate scheduler hints into submission flags
fn append_hints(command: &mut Command, hints: &SchedulerHints) {
    if let Some(memory_mb) = hints.memory_mb {
        command.arg("-M").arg(memory_mb.to_string());
    }
    if let Some(queue) = &hints.queue {
        command.arg("-q").arg(queue);
    }
    if let Some(select) = &hints.select {
        command.arg("-R").arg(select);
    }
}

#[async_trait]
impl TaskInvoker for BatchInvoker {
    async fn invoke(&self, request: TaskRequest) -> Result<Option<Artifact>, EngineError> {
        let name = request.name.clone();
        let mut artifacts = self.run(request).await?;
        match artifacts.len() {
            0 => Ok(None),
            1 => Ok(artifacts.pop()),
            n => Err(EngineError::MalformedArtifact {
                task: name,
                reason: format!("expected at most one artifact, tool reported {}", n),
            }),
        }
    }

    async fn invoke_grouped(
        &self,
        request: TaskRequest,
    ) -> Result<Option<Vec<Artifact>>, EngineError> {
        let artifacts = self.run(request).await?;
        if artifacts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(artifacts))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use sdk::types::TaskOptions;
    use std::os::unix::fs::PermissionsExt;

    fn install_tool(dir: &Path, name: &str, script: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    #[tokio::test]
    async fn test_invoke_reports_single_artifact() {
        let dir = tempfile::tempdir().unwrap();
        install_tool(dir.path(), "merge_bed", "echo /work/run1.calls.bed");

        let invoker = BatchInvoker::new(dir.path(), None);
        let artifact = invoker
            .invoke(TaskRequest::new("merge_bed"))
            .await
            .unwrap()
            .expect("artifact expected");
        assert_eq!(artifact.path(), Path::new("/work/run1.calls.bed"));
    }

    #[tokio::test]
    async fn test_silent_tool_is_business_failure() {
        let dir = tempfile::tempdir().unwrap();
        install_tool(dir.path(), "filter_samples", "exit 0");

        let invoker = BatchInvoker::new(dir.path(), None);
        let result = invoker
            .invoke(TaskRequest::new("filter_samples"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_failing_tool_is_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        install_tool(dir.path(), "gtc_to_sim", "echo boom >&2; exit 1");

        let invoker = BatchInvoker::new(dir.path(), None);
        let result = invoker.invoke(TaskRequest::new("gtc_to_sim")).await;
        assert!(matches!(
            result,
            Err(EngineError::Submission { task, .. }) if task == "gtc_to_sim"
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = BatchInvoker::new(dir.path(), None);
        let result = invoker.invoke(TaskRequest::new("no_such_tool")).await;
        assert!(matches!(result, Err(EngineError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_invoke_grouped_collects_all_lines() {
        let dir = tempfile::tempdir().unwrap();
        install_tool(
            dir.path(),
            "call_chunk",
            "echo /work/run1.15.00.bed; echo /work/run1.15.01.bed",
        );

        let invoker = BatchInvoker::new(dir.path(), None);
        let artifacts = invoker
            .invoke_grouped(TaskRequest::new("call_chunk"))
            .await
            .unwrap()
            .expect("artifacts expected");
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].file_name(), Some("run1.15.00.bed"));
        assert_eq!(artifacts[1].file_name(), Some("run1.15.01.bed"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_multiple_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        install_tool(
            dir.path(),
            "transpose_bed",
            "echo /work/a.bed; echo /work/b.bed",
        );

        let invoker = BatchInvoker::new(dir.path(), None);
        let result = invoker.invoke(TaskRequest::new("transpose_bed")).await;
        assert!(matches!(result, Err(EngineError::MalformedArtifact { .. })));
    }

    #[tokio::test]
    async fn test_options_render_to_flags() {
        let dir = tempfile::tempdir().unwrap();
        // Echo back the received argv so the test can assert flag rendering
        install_tool(dir.path(), "echo_args", r#"printf '%s\n' "$*""#);

        let invoker = BatchInvoker::new(dir.path(), None);
        let options = TaskOptions::new()
            .with("chromosome", "15")
            .with("normalize", true)
            .with("plink", false)
            .with("start", 100i64);
        let artifact = invoker
            .invoke(
                TaskRequest::new("echo_args")
                    .with_input(Artifact::new("/work/in.sim"))
                    .with_options(options),
            )
            .await
            .unwrap()
            .expect("argv echo expected");

        let argv = artifact.path().to_string_lossy().to_string();
        assert!(argv.starts_with("/work/in.sim"));
        assert!(argv.contains("--chromosome 15"));
        assert!(argv.contains("--normalize"));
        assert!(!argv.contains("--plink"));
        assert!(argv.contains("--start 100"));
    }
}
