//! Read access to the corpus of known coordinates.
//!
//! The resolution core only ever reads through [`CoordinateStore`]; how
//! records are persisted, sharded or indexed is up to the implementation.
//! [`InMemoryStore`] backs tests and the CLI's JSON store file.

use std::path::Path;

use dashmap::{DashMap, DashSet};
use depot_util::errors::DepotError;

use crate::coordinate::ProjectVersion;
use crate::metadata::{StoreProjectVersionData, TransitiveDependencyReport};

pub trait CoordinateStore: Send + Sync {
    fn find_coordinate(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> Option<StoreProjectVersionData>;

    fn find_all_coordinates(&self) -> Vec<StoreProjectVersionData>;

    /// Every known version of `group_id:artifact_id`.
    fn find_by_coordinate_prefix(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Vec<StoreProjectVersionData>;

    /// Ask the owning subsystem to restore an evicted coordinate. Must not block.
    fn request_restore(&self, _coordinate: &ProjectVersion) {}

    fn find(&self, coordinate: &ProjectVersion) -> Option<StoreProjectVersionData> {
        self.find_coordinate(
            &coordinate.group_id,
            &coordinate.artifact_id,
            &coordinate.version_id,
        )
    }
}

/// A concurrent in-memory store, loadable from and savable to a JSON array
/// of [`StoreProjectVersionData`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<ProjectVersion, StoreProjectVersionData>,
    restore_requests: DashSet<ProjectVersion>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = StoreProjectVersionData>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Load a store from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DepotError> {
        let content = std::fs::read_to_string(path).map_err(|e| DepotError::Store {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let records: Vec<StoreProjectVersionData> =
            serde_json::from_str(&content).map_err(|e| DepotError::Store {
                message: format!("Failed to parse {}: {e}", path.display()),
            })?;
        tracing::debug!("Loaded {} coordinates from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    /// Write all records, sorted by coordinate, to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), DepotError> {
        depot_util::fs::ensure_parent(path)?;
        let json = serde_json::to_string_pretty(&self.records_sorted()).map_err(|e| {
            DepotError::Store {
                message: format!("Failed to serialize store: {e}"),
            }
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: StoreProjectVersionData) {
        self.records.insert(record.coordinate.clone(), record);
    }

    pub fn remove(&self, coordinate: &ProjectVersion) -> Option<StoreProjectVersionData> {
        self.records.remove(coordinate).map(|(_, record)| record)
    }

    /// Replace the stored transitive report of an existing record.
    /// Returns `false` when the coordinate is unknown.
    pub fn set_transitive_report(
        &self,
        coordinate: &ProjectVersion,
        report: TransitiveDependencyReport,
    ) -> bool {
        match self.records.get_mut(coordinate) {
            Some(mut record) => {
                record.transitive_dependencies_report = report;
                true
            }
            None => false,
        }
    }

    /// Coordinates for which a restore was requested, sorted.
    pub fn restore_requests(&self) -> Vec<ProjectVersion> {
        let mut requests: Vec<ProjectVersion> =
            self.restore_requests.iter().map(|c| c.key().clone()).collect();
        requests.sort();
        requests
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn records_sorted(&self) -> Vec<StoreProjectVersionData> {
        let mut records: Vec<StoreProjectVersionData> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        records
    }
}

impl CoordinateStore for InMemoryStore {
    fn find_coordinate(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> Option<StoreProjectVersionData> {
        let key = ProjectVersion::new(group_id, artifact_id, version_id);
        self.records.get(&key).map(|r| r.value().clone())
    }

    fn find_all_coordinates(&self) -> Vec<StoreProjectVersionData> {
        self.records_sorted()
    }

    fn find_by_coordinate_prefix(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Vec<StoreProjectVersionData> {
        let mut records: Vec<StoreProjectVersionData> = self
            .records
            .iter()
            .filter(|r| r.key().group_id == group_id && r.key().artifact_id == artifact_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        records
    }

    fn request_restore(&self, coordinate: &ProjectVersion) {
        tracing::info!("Restore requested for evicted coordinate {coordinate}");
        self.restore_requests.insert(coordinate.clone());
    }
}
