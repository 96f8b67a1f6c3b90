//! Operation: pick one compatible version per required artifact.

use depot_core::coordinate::ProjectVersion;
use depot_resolver::CompatibleVersionResolver;

use crate::Depot;

impl Depot {
    /// Compatible versions for `coordinates`, backtracking at most
    /// `backtrack_depth` older versions per artifact (the configured default
    /// when `None`). Empty when no compatible set exists.
    pub fn resolve_compatible_versions(
        &self,
        coordinates: &[ProjectVersion],
        backtrack_depth: Option<usize>,
    ) -> Vec<ProjectVersion> {
        let depth = backtrack_depth.unwrap_or(self.backtrack_depth());
        let resolver = CompatibleVersionResolver::new(self.cache());
        let resolved = resolver.resolve_compatible_versions(coordinates, depth);
        tracing::debug!(
            "Resolved {} of {} requested coordinates at depth {depth}",
            resolved.len(),
            coordinates.len()
        );
        resolved
    }
}
