//! Artifact, option, and scheduler hint types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Reference to a file produced by a task invocation and consumed by
/// later pipeline stages.
///
/// An artifact is nothing more than a path; the engine never opens the
/// files the analysis tools produce, it only threads references between
/// stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    /// Create an artifact reference from a path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the referenced file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, if the path has one
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

impl From<PathBuf> for Artifact {
    fn from(path: PathBuf) -> Self {
        Self { path }
    }
}

/// A single option value passed to an external analysis tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Path(PathBuf),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for OptionValue {
    fn from(i: u64) -> Self {
        Self::Int(i as i64)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<PathBuf> for OptionValue {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

/// Keyed option map passed to each task invocation.
///
/// Options are layered: base run options, then caller-supplied generic
/// options, then stage-specific options. Later layers win on key
/// collision. Keys iterate in sorted order so a request always renders
/// to the same submission command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOptions {
    values: BTreeMap<String, OptionValue>,
}

impl TaskOptions {
    /// Create an empty option map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any existing value for the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Overlay `over` on top of this map; `over` wins on key collision
    pub fn layered(&self, over: &TaskOptions) -> TaskOptions {
        let mut merged = self.clone();
        for (key, value) in &over.values {
            merged.values.insert(key.clone(), value.clone());
        }
        merged
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(OptionValue::as_int)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(OptionValue::as_bool)
    }

    pub fn get_path(&self, key: &str) -> Option<&Path> {
        self.get(key).and_then(OptionValue::as_path)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate options in sorted key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Resource hints forwarded to the batch scheduler with a submission.
///
/// The engine never interprets these; the invoker translates them into
/// whatever the scheduler expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerHints {
    /// Memory to request for the job, in megabytes
    pub memory_mb: Option<u64>,

    /// Queue or job class name
    pub queue: Option<String>,

    /// Node selector expression
    pub select: Option<String>,
}

impl SchedulerHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_mb(mut self, memory_mb: u64) -> Self {
        self.memory_mb = Some(memory_mb);
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_file_name() {
        let artifact = Artifact::new("/work/run1/run1.calls.bed");
        assert_eq!(artifact.file_name(), Some("run1.calls.bed"));
    }

    #[test]
    fn test_options_set_and_get() {
        let opts = TaskOptions::new()
            .with("chunk_size", 2000i64)
            .with("queue", "normal")
            .with("normalize", true);

        assert_eq!(opts.get_int("chunk_size"), Some(2000));
        assert_eq!(opts.get_str("queue"), Some("normal"));
        assert_eq!(opts.get_bool("normalize"), Some(true));
        assert!(opts.get("missing").is_none());
    }

    #[test]
    fn test_layered_later_layer_wins() {
        let base = TaskOptions::new()
            .with("queue", "normal")
            .with("memory", 1024i64);
        let specific = TaskOptions::new().with("queue", "long");

        let merged = base.layered(&specific);
        assert_eq!(merged.get_str("queue"), Some("long"));
        assert_eq!(merged.get_int("memory"), Some(1024));
    }

    #[test]
    fn test_layered_does_not_mutate_base() {
        let base = TaskOptions::new().with("queue", "normal");
        let over = TaskOptions::new().with("queue", "long");

        let _ = base.layered(&over);
        assert_eq!(base.get_str("queue"), Some("normal"));
    }

    #[test]
    fn test_iteration_order_is_sorted() {
        let opts = TaskOptions::new()
            .with("zed", 1i64)
            .with("alpha", 2i64)
            .with("mid", 3i64);

        let keys: Vec<&str> = opts.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alpha", "mid", "zed"]);
    }

    #[test]
    fn test_options_serialization_roundtrip() {
        let opts = TaskOptions::new()
            .with("chromosome", "15")
            .with("start", 120i64);

        let serialized = serde_json::to_string(&opts).unwrap();
        let deserialized: TaskOptions = serde_json::from_str(&serialized).unwrap();
        assert_eq!(opts, deserialized);
    }

    #[test]
    fn test_scheduler_hints_builder() {
        let hints = SchedulerHints::new()
            .with_memory_mb(2048)
            .with_queue("long");

        assert_eq!(hints.memory_mb, Some(2048));
        assert_eq!(hints.queue.as_deref(), Some("long"));
        assert!(hints.select.is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn option_pairs() -> impl Strategy<Value = Vec<(String, i64)>> {
            prop::collection::vec(("[a-z]{1,6}", any::<i64>()), 0..6)
        }

        fn to_options(pairs: &[(String, i64)]) -> TaskOptions {
            let mut options = TaskOptions::new();
            for (key, value) in pairs {
                options.set(key.clone(), *value);
            }
            options
        }

        proptest! {
            /// Layer order is all that matters: applying two overlays
            /// one at a time equals applying their own merge.
            #[test]
            fn layering_is_associative(
                a in option_pairs(),
                b in option_pairs(),
                c in option_pairs(),
            ) {
                let (a, b, c) = (to_options(&a), to_options(&b), to_options(&c));
                prop_assert_eq!(
                    a.layered(&b).layered(&c),
                    a.layered(&b.layered(&c))
                );
            }
        }
    }
}
