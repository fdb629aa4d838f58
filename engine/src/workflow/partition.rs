//! Partition planning
//!
//! Derives the ordered list of chromosome-bounded work units from the
//! boundary descriptor the manifest parser produced. Planning is pure:
//! same descriptor in, same partitions out, and an absent descriptor
//! simply yields no partitions, which downstream stages read as a skip.

use sdk::errors::EngineError;
use sdk::types::Artifact;
use serde::{Deserialize, Serialize};
use std::fs;

/// One chromosome-bounded record of the boundary descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromosomeBounds {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
}

/// One chromosome-bounded unit of calling work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
}

/// Derives partition specs from the boundary descriptor
pub struct PartitionPlanner;

impl PartitionPlanner {
    /// Read the boundary descriptor JSON written by the manifest parser
    pub fn load_bounds(artifact: &Artifact) -> Result<Vec<ChromosomeBounds>, EngineError> {
        let contents =
            fs::read_to_string(artifact.path()).map_err(|e| EngineError::MalformedArtifact {
                task: "parse_manifest".to_string(),
                reason: format!("could not read {}: {}", artifact.path().display(), e),
            })?;
        serde_json::from_str(&contents).map_err(|e| EngineError::MalformedArtifact {
            task: "parse_manifest".to_string(),
            reason: format!("invalid boundary JSON: {}", e),
        })
    }

    /// Re-expose the descriptor as partition specs, preserving order.
    ///
    /// No descriptor means no partitions; the chunked phase is then
    /// skipped rather than dispatched empty.
    pub fn plan(bounds: Option<&[ChromosomeBounds]>) -> Vec<Partition> {
        bounds
            .unwrap_or_default()
            .iter()
            .map(|record| Partition {
                chromosome: record.chromosome.clone(),
                start: record.start,
                end: record.end,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(records: &[(&str, u64, u64)]) -> Vec<ChromosomeBounds> {
        records
            .iter()
            .map(|(chromosome, start, end)| ChromosomeBounds {
                chromosome: chromosome.to_string(),
                start: *start,
                end: *end,
            })
            .collect()
    }

    #[test]
    fn test_plan_preserves_descriptor_order() {
        let bounds = bounds(&[("15", 0, 1200), ("1", 1200, 9000), ("X", 9000, 9500)]);
        let partitions = PartitionPlanner::plan(Some(&bounds));

        let order: Vec<&str> = partitions
            .iter()
            .map(|p| p.chromosome.as_str())
            .collect();
        assert_eq!(order, vec!["15", "1", "X"]);
        assert_eq!(partitions[1].start, 1200);
        assert_eq!(partitions[1].end, 9000);
    }

    #[test]
    fn test_plan_absent_descriptor_is_empty() {
        assert!(PartitionPlanner::plan(None).is_empty());
        assert!(PartitionPlanner::plan(Some(&[])).is_empty());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let bounds = bounds(&[("2", 0, 100), ("3", 100, 300)]);
        let first = PartitionPlanner::plan(Some(&bounds));
        let second = PartitionPlanner::plan(Some(&bounds));
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_bounds_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run1.chr.json");
        fs::write(
            &path,
            r#"[{"chromosome":"7","start":0,"end":2500},
               {"chromosome":"8","start":2500,"end":4000}]"#,
        )
        .unwrap();

        let loaded = PartitionPlanner::load_bounds(&Artifact::new(&path)).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].chromosome, "7");
        assert_eq!(loaded[1].end, 4000);
    }

    #[test]
    fn test_load_bounds_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run1.chr.json");
        fs::write(&path, "not json").unwrap();

        let result = PartitionPlanner::load_bounds(&Artifact::new(&path));
        assert!(matches!(
            result,
            Err(EngineError::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_load_bounds_missing_file() {
        let result = PartitionPlanner::load_bounds(&Artifact::new("/nonexistent/chr.json"));
        assert!(matches!(
            result,
            Err(EngineError::MalformedArtifact { .. })
        ));
    }
}
