//! Version conflict detection within a dependency closure.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use depot_core::coordinate::{GroupArtifact, ProjectVersion};
use serde::{Deserialize, Serialize};

/// A `group:artifact` that resolves to more than one distinct version within
/// one closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionConflict {
    pub group_id: String,
    pub artifact_id: String,
    pub versions: BTreeSet<ProjectVersion>,
}

impl VersionConflict {
    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group_id, &self.artifact_id)
    }

    pub fn version_ids(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.version_id.as_str()).collect()
    }
}

/// All conflicts found in one closure, ordered by `group:artifact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `coordinates` by `group:artifact` and flag every group holding
    /// more than one distinct version.
    pub fn detect<'a>(coordinates: impl IntoIterator<Item = &'a ProjectVersion>) -> Self {
        let mut by_artifact: BTreeMap<GroupArtifact, BTreeSet<ProjectVersion>> = BTreeMap::new();
        for coordinate in coordinates {
            by_artifact
                .entry(coordinate.group_artifact())
                .or_default()
                .insert(coordinate.clone());
        }

        let conflicts = by_artifact
            .into_iter()
            .filter(|(_, versions)| versions.len() > 1)
            .map(|(ga, versions)| VersionConflict {
                group_id: ga.group_id,
                artifact_id: ga.artifact_id,
                versions,
            })
            .collect();
        Self { conflicts }
    }

    pub fn find(&self, group_id: &str, artifact_id: &str) -> Option<&VersionConflict> {
        self.conflicts
            .iter()
            .find(|c| c.group_id == group_id && c.artifact_id == artifact_id)
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} resolves to {}",
            self.group_id,
            self.artifact_id,
            self.version_ids().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv(s: &str) -> ProjectVersion {
        ProjectVersion::parse(s).unwrap()
    }

    #[test]
    fn empty_report() {
        let report = ConflictReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.to_string(), "No version conflicts.");
    }

    #[test]
    fn single_versions_are_not_conflicts() {
        let coords = [pv("g:a:1.0"), pv("g:b:1.0"), pv("g:a:1.0")];
        assert!(ConflictReport::detect(&coords).is_empty());
    }

    #[test]
    fn detects_all_conflicting_versions() {
        let coords = [
            pv("org.example:lib:2.0"),
            pv("org.example:lib:1.0"),
            pv("org.example:lib:1.5"),
            pv("org.other:util:3.0"),
        ];
        let report = ConflictReport::detect(&coords);
        assert_eq!(report.len(), 1);
        let conflict = report.find("org.example", "lib").unwrap();
        assert_eq!(conflict.version_ids(), vec!["1.0", "1.5", "2.0"]);
        assert!(report.find("org.other", "util").is_none());

        let s = report.to_string();
        assert!(s.contains("Version conflicts (1):"));
        assert!(s.contains("org.example:lib resolves to 1.0, 1.5, 2.0"));
    }
}
