//! Memoized transitive dependency closures for every known coordinate.
//!
//! [`DependencyCache`] is built eagerly from the whole store and extended on
//! demand. Each closure is computed by a post-order depth-first walk over the
//! declared direct dependencies with a per-call memo, so diamonds are
//! expanded once and cycles in bad data terminate. Coordinates on a cycle
//! are finalized together when the walk leaves the first of them (the same
//! bookkeeping as Tarjan's strongly connected components), which keeps every
//! coordinate out of its own closure.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use depot_core::coordinate::ProjectVersion;
use depot_core::metadata::{StoreProjectVersionData, TransitiveDependencyReport};
use depot_core::store::CoordinateStore;
use depot_util::errors::DepotError;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::overrides::{DependencyOverride, IdentityOverride};

/// Resolution status of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    Success,
    /// Some reachable dependency is absent from the store, excluded or evicted.
    Fail,
}

impl fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    dependencies: Arc<HashSet<ProjectVersion>>,
    status: DependencyStatus,
}

impl CacheEntry {
    fn success(dependencies: Arc<HashSet<ProjectVersion>>) -> Self {
        Self {
            dependencies,
            status: DependencyStatus::Success,
        }
    }

    fn fail() -> Self {
        Self {
            dependencies: Arc::new(HashSet::new()),
            status: DependencyStatus::Fail,
        }
    }
}

/// Outcome of an eager scan over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub scanned: usize,
    pub failed: usize,
}

/// Long-lived, thread-safe map from coordinate to its transitive closure.
///
/// Concurrent writers follow compute-if-absent semantics: the first
/// successful closure for a coordinate wins, and a `FAIL` entry is replaced
/// once a later lookup computes the closure successfully.
pub struct DependencyCache {
    store: Arc<dyn CoordinateStore>,
    overrides: Arc<dyn DependencyOverride>,
    entries: DashMap<ProjectVersion, CacheEntry>,
    absent_keys: AtomicUsize,
}

impl DependencyCache {
    /// Build the cache eagerly from every coordinate currently in `store`.
    pub fn new(store: Arc<dyn CoordinateStore>) -> Self {
        let cache = Self::lazy(store, Arc::new(IdentityOverride));
        cache.build();
        cache
    }

    /// An empty cache that only fills on demand (or via [`Self::build`]).
    pub fn lazy(store: Arc<dyn CoordinateStore>, overrides: Arc<dyn DependencyOverride>) -> Self {
        Self {
            store,
            overrides,
            entries: DashMap::new(),
            absent_keys: AtomicUsize::new(0),
        }
    }

    /// Scan the whole store in parallel, computing a closure and status for
    /// every coordinate. A failing coordinate is recorded as `FAIL` and the
    /// scan continues.
    pub fn build(&self) -> BuildSummary {
        let records = self.store.find_all_coordinates();
        let failed = AtomicUsize::new(0);

        records.par_iter().for_each(|record| {
            let coordinate = &record.coordinate;
            if self.cached_success(coordinate).is_some() {
                return;
            }
            if let Err(e) = self.compute(coordinate) {
                tracing::warn!("Dependency closure of {coordinate} failed: {e}");
                failed.fetch_add(1, Ordering::Relaxed);
                self.entries
                    .entry(coordinate.clone())
                    .or_insert_with(CacheEntry::fail);
            }
        });

        let summary = BuildSummary {
            scanned: records.len(),
            failed: failed.into_inner(),
        };
        tracing::info!(
            "Dependency cache built: {} coordinates, {} failed, {} absent references",
            summary.scanned,
            summary.failed,
            self.absent_keys()
        );
        summary
    }

    /// Like [`Self::build`] but runs on a dedicated thread pool.
    pub fn build_in(&self, pool: &ThreadPool) -> BuildSummary {
        pool.install(|| self.build())
    }

    /// The transitive closure of `coordinate`.
    ///
    /// Served from the cache when a successful entry exists; otherwise
    /// computed now and cached. Fails with `NotFound`, `Excluded` or
    /// `TransientUnavailable` when the coordinate or anything it reaches is
    /// unusable; nothing is cached for it in that case, so a retry after the
    /// store changes recomputes from scratch.
    pub fn get_transitive_dependencies(
        &self,
        coordinate: &ProjectVersion,
    ) -> Result<HashSet<ProjectVersion>, DepotError> {
        if let Some(closure) = self.cached_success(coordinate) {
            return Ok((*closure).clone());
        }
        let closure = self.compute(coordinate)?;
        Ok((*closure).clone())
    }

    /// A fresh transitive report for `coordinate`, suitable for writing
    /// back to the store.
    pub fn transitive_report(&self, coordinate: &ProjectVersion) -> TransitiveDependencyReport {
        match self.get_transitive_dependencies(coordinate) {
            Ok(closure) => TransitiveDependencyReport::valid(closure),
            Err(e) => {
                tracing::debug!("Invalid transitive report for {coordinate}: {e}");
                TransitiveDependencyReport::invalid()
            }
        }
    }

    pub fn status(&self, coordinate: &ProjectVersion) -> Option<DependencyStatus> {
        self.entries.get(coordinate).map(|e| e.status)
    }

    /// Number of references to coordinates missing from the store seen so far.
    pub fn absent_keys(&self) -> usize {
        self.absent_keys.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store(&self) -> &dyn CoordinateStore {
        self.store.as_ref()
    }

    pub fn overrides(&self) -> &dyn DependencyOverride {
        self.overrides.as_ref()
    }

    fn cached_success(&self, coordinate: &ProjectVersion) -> Option<Arc<HashSet<ProjectVersion>>> {
        self.entries
            .get(coordinate)
            .filter(|e| e.status == DependencyStatus::Success)
            .map(|e| e.dependencies.clone())
    }

    fn compute(
        &self,
        coordinate: &ProjectVersion,
    ) -> Result<Arc<HashSet<ProjectVersion>>, DepotError> {
        let mut walk = ClosureWalk::new(self, coordinate);
        walk.run(coordinate)?;
        match walk.memo.remove(coordinate) {
            Some(Visit::Done(closure)) => Ok(closure),
            _ => Err(DepotError::Generic {
                message: format!("Closure walk for {coordinate} did not complete"),
            }),
        }
    }

    fn publish(&self, coordinate: &ProjectVersion, closure: Arc<HashSet<ProjectVersion>>) {
        match self.entries.entry(coordinate.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().status == DependencyStatus::Fail {
                    existing.insert(CacheEntry::success(closure));
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::success(closure));
            }
        }
    }

    /// Fetch a record the walk is about to expand, rejecting unusable ones.
    pub(crate) fn usable_record(
        &self,
        coordinate: &ProjectVersion,
    ) -> Result<StoreProjectVersionData, DepotError> {
        let Some(record) = self.store.find(coordinate) else {
            self.absent_keys.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Coordinate {coordinate} not found in store");
            return Err(DepotError::not_found(coordinate));
        };
        check_usable(self.store.as_ref(), record)
    }
}

/// Reject excluded records, and evicted ones after requesting their restore.
pub fn check_usable(
    store: &dyn CoordinateStore,
    record: StoreProjectVersionData,
) -> Result<StoreProjectVersionData, DepotError> {
    if record.evicted {
        tracing::warn!("Coordinate {} is evicted, requesting restore", record.coordinate);
        store.request_restore(&record.coordinate);
        return Err(DepotError::TransientUnavailable {
            coordinate: record.coordinate.to_string(),
        });
    }
    if record.excluded {
        return Err(DepotError::Excluded {
            coordinate: record.coordinate.to_string(),
            reason: record.exclusion_reason().to_string(),
        });
    }
    Ok(record)
}

enum Visit {
    /// Entered but not finalized: still on the walk stack, or waiting for
    /// the first coordinate of its cycle to finish.
    Open { index: usize },
    Done(Arc<HashSet<ProjectVersion>>),
}

/// One coordinate on the walk stack.
struct Frame {
    coordinate: ProjectVersion,
    index: usize,
    /// Lowest open index reachable from this coordinate.
    low: usize,
    deps: Vec<ProjectVersion>,
    next: usize,
    closure: HashSet<ProjectVersion>,
}

/// State for computing one closure; never shared between calls.
struct ClosureWalk<'a> {
    cache: &'a DependencyCache,
    requested: Vec<ProjectVersion>,
    memo: HashMap<ProjectVersion, Visit>,
    next_index: usize,
    open: Vec<ProjectVersion>,
}

impl<'a> ClosureWalk<'a> {
    fn new(cache: &'a DependencyCache, root: &ProjectVersion) -> Self {
        Self {
            cache,
            requested: vec![root.clone()],
            memo: HashMap::new(),
            next_index: 0,
            open: Vec::new(),
        }
    }

    /// Depth-first post-order walk from `root` on an explicit frame stack.
    /// Every coordinate reached is finalized into `memo` (and published to
    /// the cache) unless the walk fails.
    fn run(&mut self, root: &ProjectVersion) -> Result<(), DepotError> {
        let first = self.enter(root)?;
        let mut stack = vec![first];

        while let Some(frame) = stack.last_mut() {
            let Some(dep) = frame.deps.get(frame.next).cloned() else {
                if let Some(done) = stack.pop() {
                    self.leave(done, stack.last_mut());
                }
                continue;
            };
            frame.next += 1;
            if dep == frame.coordinate {
                continue;
            }

            match self.memo.get(&dep) {
                Some(Visit::Open { index }) => {
                    frame.low = frame.low.min(*index);
                    frame.closure.insert(dep);
                    continue;
                }
                Some(Visit::Done(done)) => {
                    frame.closure.extend(done.iter().cloned());
                    frame.closure.insert(dep);
                    continue;
                }
                None => {}
            }

            if let Some(cached) = self.cache.cached_success(&dep) {
                frame.closure.extend(cached.iter().cloned());
                frame.closure.insert(dep.clone());
                self.memo.insert(dep, Visit::Done(cached));
                continue;
            }
            let child = self.enter(&dep)?;
            stack.push(child);
        }
        Ok(())
    }

    /// Open a frame for `coordinate`, rejecting unusable records.
    fn enter(&mut self, coordinate: &ProjectVersion) -> Result<Frame, DepotError> {
        let record = self.cache.usable_record(coordinate)?;
        let index = self.next_index;
        self.next_index += 1;
        self.memo.insert(coordinate.clone(), Visit::Open { index });
        self.open.push(coordinate.clone());

        let deps = self.cache.overrides.override_with(
            &record.dependencies,
            &self.requested,
            self.cache.store.as_ref(),
        );
        Ok(Frame {
            coordinate: coordinate.clone(),
            index,
            low: index,
            deps,
            next: 0,
            closure: HashSet::new(),
        })
    }

    /// Finish `frame` once all its dependencies are walked and fold its
    /// result into `parent`.
    fn leave(&mut self, mut frame: Frame, parent: Option<&mut Frame>) {
        frame.closure.remove(&frame.coordinate);
        if frame.low == frame.index {
            self.finalize(&frame.coordinate, &frame.closure);
        }
        if let Some(parent) = parent {
            parent.low = parent.low.min(frame.low);
            parent.closure.extend(frame.closure);
            parent.closure.insert(frame.coordinate);
        }
    }

    /// Close the cycle group headed by `head`: every open coordinate entered
    /// after it reaches exactly what `head` reaches, plus `head` itself.
    fn finalize(&mut self, head: &ProjectVersion, closure: &HashSet<ProjectVersion>) {
        let start = self
            .open
            .iter()
            .rposition(|c| c == head)
            .unwrap_or(self.open.len());
        let members: Vec<ProjectVersion> = self.open.drain(start..).collect();

        for member in members {
            let member_closure = if &member == head {
                Arc::new(closure.clone())
            } else {
                tracing::debug!("{member} is on a dependency cycle through {head}");
                let mut shared = closure.clone();
                shared.insert(head.clone());
                shared.remove(&member);
                Arc::new(shared)
            };
            self.cache.publish(&member, member_closure.clone());
            self.memo.insert(member, Visit::Done(member_closure));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::store::InMemoryStore;

    fn pv(s: &str) -> ProjectVersion {
        ProjectVersion::parse(s).unwrap()
    }

    fn record(coord: &str, deps: &[&str]) -> StoreProjectVersionData {
        StoreProjectVersionData::new(pv(coord)).with_dependencies(deps.iter().map(|d| pv(d)))
    }

    fn set(items: &[&str]) -> HashSet<ProjectVersion> {
        items.iter().map(|s| pv(s)).collect()
    }

    #[test]
    fn leaf_has_empty_closure() {
        let store = Arc::new(InMemoryStore::from_records([record("g:c:1", &[])]));
        let cache = DependencyCache::new(store);
        assert!(cache.get_transitive_dependencies(&pv("g:c:1")).unwrap().is_empty());
        assert_eq!(cache.status(&pv("g:c:1")), Some(DependencyStatus::Success));
    }

    #[test]
    fn self_dependency_is_ignored() {
        let store = Arc::new(InMemoryStore::from_records([
            record("g:a:1", &["g:a:1", "g:b:1"]),
            record("g:b:1", &[]),
        ]));
        let cache = DependencyCache::new(store);
        assert_eq!(
            cache.get_transitive_dependencies(&pv("g:a:1")).unwrap(),
            set(&["g:b:1"])
        );
    }

    #[test]
    fn two_cycle_terminates_without_self_loops() {
        let store = Arc::new(InMemoryStore::from_records([
            record("g:a:1", &["g:b:1"]),
            record("g:b:1", &["g:a:1", "g:c:1"]),
            record("g:c:1", &[]),
        ]));
        let cache = DependencyCache::new(store);
        assert_eq!(
            cache.get_transitive_dependencies(&pv("g:a:1")).unwrap(),
            set(&["g:b:1", "g:c:1"])
        );
        assert_eq!(
            cache.get_transitive_dependencies(&pv("g:b:1")).unwrap(),
            set(&["g:a:1", "g:c:1"])
        );
    }

    #[test]
    fn cycle_members_reached_from_outside_are_complete() {
        // x -> a -> b -> c -> a, and c -> d
        let store = Arc::new(InMemoryStore::from_records([
            record("g:x:1", &["g:a:1"]),
            record("g:a:1", &["g:b:1"]),
            record("g:b:1", &["g:c:1"]),
            record("g:c:1", &["g:a:1", "g:d:1"]),
            record("g:d:1", &[]),
        ]));
        let cache = DependencyCache::lazy(store, Arc::new(IdentityOverride));
        assert_eq!(
            cache.get_transitive_dependencies(&pv("g:x:1")).unwrap(),
            set(&["g:a:1", "g:b:1", "g:c:1", "g:d:1"])
        );
        // Cycle members were finalized and cached during the same walk.
        assert_eq!(cache.status(&pv("g:b:1")), Some(DependencyStatus::Success));
        assert_eq!(
            cache.get_transitive_dependencies(&pv("g:b:1")).unwrap(),
            set(&["g:a:1", "g:c:1", "g:d:1"])
        );
    }

    fn chain(len: usize) -> Vec<StoreProjectVersionData> {
        (0..len)
            .map(|i| {
                let rec = StoreProjectVersionData::new(pv(&format!("g:a{i}:1")));
                if i + 1 < len {
                    rec.with_dependencies([pv(&format!("g:a{}:1", i + 1))])
                } else {
                    rec
                }
            })
            .collect()
    }

    #[test]
    fn long_chain_resolves_without_deep_recursion() {
        let store = Arc::new(InMemoryStore::from_records(chain(3000)));
        let cache = DependencyCache::lazy(store, Arc::new(IdentityOverride));
        let closure = cache.get_transitive_dependencies(&pv("g:a0:1")).unwrap();
        assert_eq!(closure.len(), 2999);
        assert!(!closure.contains(&pv("g:a0:1")));
        assert_eq!(
            cache.get_transitive_dependencies(&pv("g:a2998:1")).unwrap(),
            set(&["g:a2999:1"])
        );
    }

    #[test]
    fn long_cycle_terminates_with_exact_closures() {
        let mut records = chain(2000);
        records[1999] = record("g:a1999:1", &["g:a0:1"]);
        let store = Arc::new(InMemoryStore::from_records(records));
        let cache = DependencyCache::lazy(store, Arc::new(IdentityOverride));
        let closure = cache.get_transitive_dependencies(&pv("g:a0:1")).unwrap();
        assert_eq!(closure.len(), 1999);
        let tail = cache.get_transitive_dependencies(&pv("g:a1000:1")).unwrap();
        assert_eq!(tail.len(), 1999);
        assert!(tail.contains(&pv("g:a0:1")));
        assert!(!tail.contains(&pv("g:a1000:1")));
    }

    #[test]
    fn evicted_dependency_requests_restore() {
        let store = Arc::new(InMemoryStore::from_records([
            record("g:a:1", &["g:b:1"]),
            record("g:b:1", &[]).evicted(),
        ]));
        let cache = DependencyCache::lazy(store.clone(), Arc::new(IdentityOverride));
        let err = cache.get_transitive_dependencies(&pv("g:a:1")).unwrap_err();
        assert!(matches!(err, DepotError::TransientUnavailable { .. }));
        assert_eq!(store.restore_requests(), vec![pv("g:b:1")]);
        assert!(cache.status(&pv("g:a:1")).is_none());
    }

    #[test]
    fn transitive_report_reflects_failure() {
        let store = Arc::new(InMemoryStore::from_records([record("g:a:1", &["g:x:1"])]));
        let cache = DependencyCache::lazy(store, Arc::new(IdentityOverride));
        let report = cache.transitive_report(&pv("g:a:1"));
        assert!(!report.valid);
        assert!(report.dependencies.is_empty());
    }

    #[test]
    fn status_display() {
        assert_eq!(DependencyStatus::Success.to_string(), "SUCCESS");
        assert_eq!(DependencyStatus::Fail.to_string(), "FAIL");
    }
}
