//! Configuration management
//!
//! This module handles loading and validation of the Genoflow
//! configuration, plus the typed per-run workflow options. Engine
//! configuration is stored in TOML format at ~/.genoflow/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **tools**: Analysis tool search path
//! - **scheduler**: Submission command and default queue
//!
//! Per-run options arrive on the command line, are folded into
//! [`WorkflowOptions`], and are validated once before the workflow
//! starts; stages never re-check them piecemeal.

use sdk::errors::EngineError;
use sdk::types::SchedulerHints;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default chunk size: markers analysed by a single calling job
pub const DEFAULT_CHUNK_SIZE: u64 = 2000;

/// Default grouping size: chunks batched into one scheduler submission
pub const DEFAULT_GROUP_SIZE: u64 = 50;

/// Default memory request per job, in megabytes
pub const DEFAULT_MEMORY_MB: u64 = 1024;

/// Default gender determination method name
pub const DEFAULT_GENDER_METHOD: &str = "Inferred";

/// Main configuration structure
///
/// This structure represents the complete Genoflow configuration loaded
/// from ~/.genoflow/config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Analysis tool settings
    pub tools: ToolsConfig,

    /// Batch scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Analysis tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory containing the analysis tool executables (supports ~ expansion)
    pub path: PathBuf,
}

/// Batch scheduler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Submission wrapper command (e.g. "bsub"); jobs run directly when unset
    #[serde(default)]
    pub submit: Option<String>,

    /// Queue used when a run does not name one
    #[serde(default)]
    pub default_queue: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Default configuration file path: ~/.genoflow/config.toml
    pub fn default_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".genoflow").join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, EngineError> {
        Self::load_from_path(&Self::default_path()?)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Could not read {}: {}", path.display(), e))
        })?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Invalid TOML in {}: {}", path.display(), e)))?;

        config.tools.path = expand_tilde(&config.tools.path);
        Ok(config)
    }
}

/// Expand a leading ~ to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Typed per-run workflow options.
///
/// Every recognized run option has a named field with a documented
/// default. [`validate`](Self::validate) is called once at the workflow
/// entry point; after that, stages may trust every field.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    /// Path of the chip manifest file. Required.
    pub manifest: PathBuf,

    /// Path of a custom pipeline database config for re-collation
    pub db_config: Option<PathBuf>,

    /// Scheduler queue hint
    pub queue: Option<String>,

    /// Memory to request per job, in megabytes
    pub memory_mb: u64,

    /// Scheduler node-selector hint
    pub select: Option<String>,

    /// Markers analysed by a single calling job
    pub chunk_size: u64,

    /// Calling jobs grouped into one scheduler submission
    pub group_size: u64,

    /// Gender determination method name
    pub gender_method: String,

    /// Path of a custom sample filter threshold file
    pub filter_config: Option<PathBuf>,

    /// Skip sample filtering entirely
    pub no_filter: bool,
}

impl WorkflowOptions {
    /// Options for the given manifest with every default applied
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            db_config: None,
            queue: None,
            memory_mb: DEFAULT_MEMORY_MB,
            select: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            group_size: DEFAULT_GROUP_SIZE,
            gender_method: DEFAULT_GENDER_METHOD.to_string(),
            filter_config: None,
            no_filter: false,
        }
    }

    /// Validate the option set once, before the workflow starts.
    ///
    /// Filtering with built-in default thresholds needs the pipeline
    /// database config, so that combination is rejected up front rather
    /// than failing mid-run.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.manifest.as_os_str().is_empty() {
            return Err(EngineError::InvalidOption {
                key: "manifest".to_string(),
                reason: "a chip manifest path is required".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(EngineError::InvalidOption {
                key: "chunk_size".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.group_size == 0 {
            return Err(EngineError::InvalidOption {
                key: "group_size".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.memory_mb == 0 {
            return Err(EngineError::InvalidOption {
                key: "memory".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.gender_method.is_empty() {
            return Err(EngineError::InvalidOption {
                key: "gender_method".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !self.no_filter && self.filter_config.is_none() && self.db_config.is_none() {
            return Err(EngineError::InvalidOption {
                key: "filter_config".to_string(),
                reason: "default filter thresholds require the db config option".to_string(),
            });
        }
        Ok(())
    }

    /// Scheduler hints shared by every job in the run
    pub fn scheduler_hints(&self) -> SchedulerHints {
        SchedulerHints {
            memory_mb: Some(self.memory_mb),
            queue: self.queue.clone(),
            select: self.select.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[tools]
path = "/opt/genotyping/bin"
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.tools.path, PathBuf::from("/opt/genotyping/bin"));
        assert!(config.scheduler.submit.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[core]
log_level = "debug"

[tools]
path = "/opt/genotyping/bin"

[scheduler]
submit = "bsub"
default_queue = "normal"
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.core.log_level, "debug");
        assert_eq!(config.scheduler.submit.as_deref(), Some("bsub"));
        assert_eq!(config.scheduler.default_queue.as_deref(), Some("normal"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from_path(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "not valid toml [");
        let result = Config::load_from_path(&path);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_workflow_options_defaults() {
        let options = WorkflowOptions::new("/data/chip.bpm.csv");
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(options.group_size, DEFAULT_GROUP_SIZE);
        assert_eq!(options.memory_mb, DEFAULT_MEMORY_MB);
        assert_eq!(options.gender_method, "Inferred");
        assert!(!options.no_filter);
    }

    #[test]
    fn test_validate_requires_manifest() {
        let options = WorkflowOptions::new("");
        assert!(matches!(
            options.validate(),
            Err(EngineError::InvalidOption { key, .. }) if key == "manifest"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut options = WorkflowOptions::new("/data/chip.bpm.csv");
        options.no_filter = true;
        options.chunk_size = 0;
        assert!(matches!(
            options.validate(),
            Err(EngineError::InvalidOption { key, .. }) if key == "chunk_size"
        ));
    }

    #[test]
    fn test_validate_default_thresholds_need_db_config() {
        let options = WorkflowOptions::new("/data/chip.bpm.csv");
        assert!(matches!(
            options.validate(),
            Err(EngineError::InvalidOption { key, .. }) if key == "filter_config"
        ));

        let mut with_config = WorkflowOptions::new("/data/chip.bpm.csv");
        with_config.db_config = Some(PathBuf::from("/data/pipedb.ini"));
        assert!(with_config.validate().is_ok());

        let mut with_thresholds = WorkflowOptions::new("/data/chip.bpm.csv");
        with_thresholds.filter_config = Some(PathBuf::from("/data/thresholds.json"));
        assert!(with_thresholds.validate().is_ok());

        let mut bypassed = WorkflowOptions::new("/data/chip.bpm.csv");
        bypassed.no_filter = true;
        assert!(bypassed.validate().is_ok());
    }

    #[test]
    fn test_scheduler_hints_from_options() {
        let mut options = WorkflowOptions::new("/data/chip.bpm.csv");
        options.queue = Some("long".to_string());
        options.memory_mb = 2048;

        let hints = options.scheduler_hints();
        assert_eq!(hints.memory_mb, Some(2048));
        assert_eq!(hints.queue.as_deref(), Some("long"));
        assert!(hints.select.is_none());
    }
}
