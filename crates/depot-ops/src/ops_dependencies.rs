//! Operation: direct or transitive dependencies of one coordinate.

use std::collections::BTreeSet;

use depot_core::coordinate::ProjectVersion;
use depot_resolver::cache::check_usable;
use depot_util::errors::{DepotError, DepotResult};

use crate::Depot;

impl Depot {
    /// Direct dependencies of `coordinate` after the cache's override policy,
    /// or its full transitive closure when `include_transitive` is set.
    ///
    /// Fails when `coordinate` (or, for the closure, anything it reaches) is
    /// missing, excluded or evicted.
    pub fn get_direct_and_transitive_dependencies(
        &self,
        coordinate: &ProjectVersion,
        include_transitive: bool,
    ) -> DepotResult<BTreeSet<ProjectVersion>> {
        if include_transitive {
            let closure = self.cache().get_transitive_dependencies(coordinate)?;
            return Ok(closure.into_iter().collect());
        }

        let record = self
            .store()
            .find(coordinate)
            .ok_or_else(|| DepotError::not_found(coordinate))?;
        let record = check_usable(self.store(), record)?;
        let direct = self.cache().overrides().override_with(
            &record.dependencies,
            std::slice::from_ref(coordinate),
            self.store(),
        );
        Ok(direct.into_iter().filter(|d| d != coordinate).collect())
    }
}
