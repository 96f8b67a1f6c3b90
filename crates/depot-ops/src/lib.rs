//! Caller-facing depot operations.
//!
//! [`Depot`] owns the long-lived dependency cache over one coordinate store
//! and the optional thread pool used for corpus-wide scans. Each `ops_*`
//! module adds one operation to it.

pub mod ops_conflicts;
pub mod ops_dependencies;
pub mod ops_dependents;
pub mod ops_refresh;
pub mod ops_report;
pub mod ops_resolve;

use std::sync::Arc;

use depot_core::config::{CacheConfig, DepotConfig};
use depot_core::store::CoordinateStore;
use depot_resolver::cache::BuildSummary;
use depot_resolver::{DependencyCache, DependencyOverride, IdentityOverride};
use depot_util::errors::{DepotError, DepotResult};
use rayon::{ThreadPool, ThreadPoolBuilder};

pub struct Depot {
    store: Arc<dyn CoordinateStore>,
    cache: DependencyCache,
    pool: Option<ThreadPool>,
    backtrack_depth: usize,
}

impl Depot {
    /// Open a depot over `store` with the identity override policy, building
    /// the dependency cache now when `[cache] eager` is set.
    pub fn open(store: Arc<dyn CoordinateStore>, config: &DepotConfig) -> DepotResult<Self> {
        Self::with_override(store, config, Arc::new(IdentityOverride))
    }

    pub fn with_override(
        store: Arc<dyn CoordinateStore>,
        config: &DepotConfig,
        overrides: Arc<dyn DependencyOverride>,
    ) -> DepotResult<Self> {
        let pool = build_pool(&config.cache)?;
        let cache = DependencyCache::lazy(store.clone(), overrides);
        let depot = Self {
            store,
            cache,
            pool,
            backtrack_depth: config.resolver.backtrack_depth,
        };
        if config.cache.eager {
            depot.build_cache();
        }
        Ok(depot)
    }

    /// Scan the whole store into the dependency cache.
    pub fn build_cache(&self) -> BuildSummary {
        match &self.pool {
            Some(pool) => self.cache.build_in(pool),
            None => self.cache.build(),
        }
    }

    pub fn store(&self) -> &dyn CoordinateStore {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &DependencyCache {
        &self.cache
    }

    /// Default backtrack depth for compatible version resolution.
    pub fn backtrack_depth(&self) -> usize {
        self.backtrack_depth
    }

    /// Run `f` inside the configured thread pool, or the global one.
    pub(crate) fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}

fn build_pool(config: &CacheConfig) -> DepotResult<Option<ThreadPool>> {
    let Some(threads) = config.threads else {
        return Ok(None);
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("depot-scan-{i}"))
        .build()
        .map_err(|e| DepotError::Config {
            message: format!("Failed to start {threads} scan threads: {e}"),
        })?;
    tracing::debug!("Using a dedicated pool of {threads} scan threads");
    Ok(Some(pool))
}
