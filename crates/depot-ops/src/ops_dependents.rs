//! Operation: reverse dependency lookup across the whole corpus.

use std::collections::BTreeSet;

use depot_core::coordinate::ProjectVersion;
use rayon::prelude::*;

use crate::Depot;

impl Depot {
    /// Every coordinate that depends on `coordinate`: declared directly, or
    /// anywhere in its closure when `transitive` is set. Coordinates whose
    /// closure cannot be computed are skipped in the transitive scan.
    pub fn dependents(&self, coordinate: &ProjectVersion, transitive: bool) -> BTreeSet<ProjectVersion> {
        let records = self.store().find_all_coordinates();
        self.install(|| {
            records
                .par_iter()
                .filter(|record| &record.coordinate != coordinate)
                .filter(|record| {
                    if !transitive {
                        return record.dependencies.contains(coordinate);
                    }
                    self.cache()
                        .get_transitive_dependencies(&record.coordinate)
                        .map(|closure| closure.contains(coordinate))
                        .unwrap_or(false)
                })
                .map(|record| record.coordinate.clone())
                .collect()
        })
    }
}
