//! Per-coordinate records owned by the coordinate store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::coordinate::ProjectVersion;

/// A previously computed transitive dependency closure.
///
/// `valid == false` means the closure could not be computed (a missing or
/// excluded member was reached) and must not be trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitiveDependencyReport {
    #[serde(default)]
    pub dependencies: BTreeSet<ProjectVersion>,
    #[serde(default)]
    pub valid: bool,
}

impl TransitiveDependencyReport {
    pub fn valid(dependencies: impl IntoIterator<Item = ProjectVersion>) -> Self {
        Self {
            dependencies: dependencies.into_iter().collect(),
            valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Store record for one coordinate: declared dependencies, exclusion and
/// eviction flags, and the last transitive report computed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProjectVersionData {
    #[serde(flatten)]
    pub coordinate: ProjectVersion,
    /// Identifier of the owning project, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<ProjectVersion>,
    #[serde(default)]
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_reason: Option<String>,
    #[serde(default)]
    pub evicted: bool,
    #[serde(default)]
    pub transitive_dependencies_report: TransitiveDependencyReport,
}

impl StoreProjectVersionData {
    pub fn new(coordinate: ProjectVersion) -> Self {
        Self {
            coordinate,
            project_id: None,
            dependencies: Vec::new(),
            excluded: false,
            exclusion_reason: None,
            evicted: false,
            transitive_dependencies_report: TransitiveDependencyReport::default(),
        }
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = ProjectVersion>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_report(mut self, report: TransitiveDependencyReport) -> Self {
        self.transitive_dependencies_report = report;
        self
    }

    /// Mark the record excluded with a human-readable reason.
    pub fn excluded(mut self, reason: impl Into<String>) -> Self {
        self.excluded = true;
        self.exclusion_reason = Some(reason.into());
        self
    }

    pub fn evicted(mut self) -> Self {
        self.evicted = true;
        self
    }

    pub fn exclusion_reason(&self) -> &str {
        self.exclusion_reason.as_deref().unwrap_or("no reason given")
    }
}
