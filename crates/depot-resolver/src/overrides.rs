//! Pluggable policy for overriding declared dependencies during a walk.

use depot_core::coordinate::ProjectVersion;
use depot_core::store::CoordinateStore;

/// Rewrites a coordinate's declared direct dependencies before they are
/// followed.
///
/// `requested` is the set of coordinates the current request started from;
/// `store` gives the policy read access to the corpus.
pub trait DependencyOverride: Send + Sync {
    fn override_with(
        &self,
        declared: &[ProjectVersion],
        requested: &[ProjectVersion],
        store: &dyn CoordinateStore,
    ) -> Vec<ProjectVersion>;
}

/// Follows declared dependencies unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityOverride;

impl DependencyOverride for IdentityOverride {
    fn override_with(
        &self,
        declared: &[ProjectVersion],
        _requested: &[ProjectVersion],
        _store: &dyn CoordinateStore,
    ) -> Vec<ProjectVersion> {
        declared.to_vec()
    }
}

/// Pins every declared dependency on a `group:artifact` that is also among
/// the requested coordinates to the requested version.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestedVersionOverride;

impl DependencyOverride for RequestedVersionOverride {
    fn override_with(
        &self,
        declared: &[ProjectVersion],
        requested: &[ProjectVersion],
        _store: &dyn CoordinateStore,
    ) -> Vec<ProjectVersion> {
        let mut out: Vec<ProjectVersion> = Vec::with_capacity(declared.len());
        for dep in declared {
            let pinned = requested
                .iter()
                .find(|r| r.same_artifact(dep))
                .unwrap_or(dep)
                .clone();
            if !out.contains(&pinned) {
                out.push(pinned);
            }
        }
        out
    }
}
