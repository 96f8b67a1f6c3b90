//! Operation: dependency report and tree for a set of coordinates.

use depot_core::coordinate::ProjectVersion;
use depot_resolver::report::{self, DependencyReport};
use depot_util::errors::DepotResult;

use crate::Depot;

impl Depot {
    /// The serializable dependency graph rooted at `coordinates`, with every
    /// version conflict in their combined closure.
    pub fn get_dependency_report(
        &self,
        coordinates: &[ProjectVersion],
    ) -> DepotResult<DependencyReport> {
        let report = report::get_project_dependency_report(
            self.store(),
            self.cache().overrides(),
            coordinates,
        )?;
        if report.has_conflicts() {
            tracing::info!(
                "Dependency report for {} roots has {} conflicts",
                coordinates.len(),
                report.conflicts.len()
            );
        }
        Ok(report)
    }

    /// Render the dependency graph of `coordinates` as an indented tree.
    pub fn dependency_tree(
        &self,
        coordinates: &[ProjectVersion],
        max_depth: Option<usize>,
    ) -> DepotResult<String> {
        let graph = report::build_graph(self.store(), self.cache().overrides(), coordinates)?;
        Ok(graph.print_tree(max_depth))
    }
}
