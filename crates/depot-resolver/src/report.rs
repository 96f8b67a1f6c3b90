//! Serializable dependency reports over a set of required coordinates.

use std::collections::BTreeSet;

use depot_core::coordinate::ProjectVersion;
use depot_core::store::CoordinateStore;
use depot_util::errors::DepotError;
use serde::{Deserialize, Serialize};

use crate::cache::check_usable;
use crate::conflict::{ConflictReport, VersionConflict};
use crate::graph::{build_dependency_graph, DependencyGraph, WalkContext};
use crate::overrides::DependencyOverride;

/// One graph node with its owning project and its edges as coordinate strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReportNode {
    pub group_id: String,
    pub artifact_id: String,
    pub version_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Coordinates this node depends on.
    pub forward_edges: Vec<String>,
    /// Coordinates depending on this node.
    pub back_edges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub nodes: Vec<DependencyReportNode>,
    pub root_nodes: Vec<String>,
    pub conflicts: Vec<VersionConflict>,
}

impl DependencyReport {
    pub fn node(&self, coordinate: &ProjectVersion) -> Option<&DependencyReportNode> {
        self.nodes.iter().find(|n| {
            n.group_id == coordinate.group_id
                && n.artifact_id == coordinate.artifact_id
                && n.version_id == coordinate.version_id
        })
    }

    pub fn conflict(&self, group_id: &str, artifact_id: &str) -> Option<&VersionConflict> {
        self.conflicts
            .iter()
            .find(|c| c.group_id == group_id && c.artifact_id == artifact_id)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Walk the store from `required` and return the resulting graph with the
/// required coordinates marked as roots.
pub fn build_graph(
    store: &dyn CoordinateStore,
    overrides: &dyn DependencyOverride,
    required: &[ProjectVersion],
) -> Result<DependencyGraph, DepotError> {
    let mut graph = DependencyGraph::new();
    let mut ctx = WalkContext::new(store, overrides, required);
    build_dependency_graph(&mut graph, None, required, &mut ctx)?;
    for root in required {
        graph.add_root(root.clone());
    }
    Ok(graph)
}

/// Build the dependency report for `required`.
///
/// Every required coordinate must exist and carry a valid stored transitive
/// report; those reports supply the full reachable set used for conflict
/// detection.
pub fn get_project_dependency_report(
    store: &dyn CoordinateStore,
    overrides: &dyn DependencyOverride,
    required: &[ProjectVersion],
) -> Result<DependencyReport, DepotError> {
    let mut reachable: BTreeSet<ProjectVersion> = BTreeSet::new();
    for coordinate in required {
        let record = store
            .find(coordinate)
            .ok_or_else(|| DepotError::not_found(coordinate))?;
        let record = check_usable(store, record)?;
        if !record.transitive_dependencies_report.valid {
            return Err(DepotError::InvalidClosure {
                coordinate: coordinate.to_string(),
            });
        }
        reachable.insert(coordinate.clone());
        reachable.extend(record.transitive_dependencies_report.dependencies);
    }

    let graph = build_graph(store, overrides, required)?;
    tracing::debug!(
        "Dependency graph for {} roots: {} nodes, {} edges",
        required.len(),
        graph.len(),
        graph.edge_count()
    );
    Ok(build_report_from_graph(&graph, &reachable, store))
}

/// Serialize `graph`, enriching nodes with their project identifier and
/// computing conflicts over `reachable` together with the graph's nodes.
pub fn build_report_from_graph(
    graph: &DependencyGraph,
    reachable: &BTreeSet<ProjectVersion>,
    store: &dyn CoordinateStore,
) -> DependencyReport {
    let nodes = graph
        .nodes()
        .into_iter()
        .map(|node| DependencyReportNode {
            group_id: node.group_id.clone(),
            artifact_id: node.artifact_id.clone(),
            version_id: node.version_id.clone(),
            project_id: store.find(node).and_then(|r| r.project_id),
            forward_edges: graph
                .dependencies_of(node)
                .iter()
                .map(|d| d.to_string())
                .collect(),
            back_edges: graph
                .dependents_of(node)
                .iter()
                .map(|d| d.to_string())
                .collect(),
        })
        .collect();

    let all = reachable.iter().chain(graph.nodes());
    DependencyReport {
        nodes,
        root_nodes: graph.roots().iter().map(|r| r.to_string()).collect(),
        conflicts: ConflictReport::detect(all).conflicts,
    }
}
