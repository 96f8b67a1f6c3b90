//! Operation: recompute stored transitive reports in bulk.

use depot_core::coordinate::ProjectVersion;
use depot_core::metadata::TransitiveDependencyReport;
use rayon::prelude::*;

use crate::Depot;

/// A recomputed report and whether it differs from the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedReport {
    pub coordinate: ProjectVersion,
    pub report: TransitiveDependencyReport,
    pub changed: bool,
}

impl Depot {
    /// Recompute the transitive report of every coordinate in the store,
    /// sorted by coordinate. Reports are `valid` exactly when the closure
    /// resolves now.
    pub fn refresh(&self) -> Vec<RefreshedReport> {
        let records = self.store().find_all_coordinates();
        let mut refreshed: Vec<RefreshedReport> = self.install(|| {
            records
                .par_iter()
                .map(|record| {
                    let report = self.cache().transitive_report(&record.coordinate);
                    RefreshedReport {
                        coordinate: record.coordinate.clone(),
                        changed: report != record.transitive_dependencies_report,
                        report,
                    }
                })
                .collect()
        });
        refreshed.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));

        let invalid = refreshed.iter().filter(|r| !r.report.valid).count();
        let changed = refreshed.iter().filter(|r| r.changed).count();
        tracing::info!(
            "Refreshed {} transitive reports: {changed} changed, {invalid} invalid",
            refreshed.len()
        );
        refreshed
    }
}
