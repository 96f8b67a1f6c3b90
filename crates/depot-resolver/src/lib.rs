//! Dependency resolution core: a memoized transitive-closure cache over the
//! coordinate store, dependency graph construction with conflict reporting,
//! and compatible version selection encoded as weighted MaxSAT.

pub mod cache;
pub mod conflict;
pub mod graph;
pub mod maxsat;
pub mod overrides;
pub mod report;
pub mod resolver;
pub mod version;

pub use cache::{DependencyCache, DependencyStatus};
pub use conflict::{ConflictReport, VersionConflict};
pub use graph::DependencyGraph;
pub use overrides::{DependencyOverride, IdentityOverride, RequestedVersionOverride};
pub use report::{get_project_dependency_report, DependencyReport};
pub use resolver::CompatibleVersionResolver;
