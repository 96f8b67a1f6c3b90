//! Operation: corpus-wide version conflict scan.

use std::fmt;

use depot_core::coordinate::ProjectVersion;
use depot_resolver::conflict::{ConflictReport, VersionConflict};
use rayon::prelude::*;
use serde::Serialize;

use crate::Depot;

/// The conflicts found in one coordinate's closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConflicts {
    pub coordinate: ProjectVersion,
    pub conflicts: Vec<VersionConflict>,
}

impl fmt::Display for ProjectConflicts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.coordinate)?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl Depot {
    /// Every coordinate whose closure resolves and contains more than one
    /// version of some `group:artifact`, sorted by coordinate. Coordinates
    /// whose closure cannot be computed are skipped.
    pub fn find_version_conflicts(&self) -> Vec<ProjectConflicts> {
        let records = self.store().find_all_coordinates();
        let mut found: Vec<ProjectConflicts> = self.install(|| {
            records
                .par_iter()
                .filter_map(|record| {
                    let coordinate = &record.coordinate;
                    let closure = match self.cache().get_transitive_dependencies(coordinate) {
                        Ok(closure) => closure,
                        Err(e) => {
                            tracing::debug!("Skipping conflict scan of {coordinate}: {e}");
                            return None;
                        }
                    };
                    let report =
                        ConflictReport::detect(closure.iter().chain(std::iter::once(coordinate)));
                    (!report.is_empty()).then(|| ProjectConflicts {
                        coordinate: coordinate.clone(),
                        conflicts: report.conflicts,
                    })
                })
                .collect()
        });
        found.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        tracing::info!(
            "Conflict scan over {} coordinates found {} with conflicts",
            records.len(),
            found.len()
        );
        found
    }
}
