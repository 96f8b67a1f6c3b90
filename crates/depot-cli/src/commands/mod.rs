//! Command dispatch and handler modules.

mod conflicts;
mod deps;
mod dependents;
mod refresh;
mod report;
mod resolve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use depot_core::config::DepotConfig;
use depot_core::coordinate::ProjectVersion;
use depot_core::store::InMemoryStore;
use depot_ops::Depot;
use depot_util::errors::{DepotError, DepotResult};
use depot_util::progress;
use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let session = Session::open(cli.store.as_deref())?;
    match cli.command {
        Command::Deps { coordinate, direct } => deps::exec(&session, &coordinate, direct),
        Command::Report {
            coordinates,
            tree,
            depth,
        } => report::exec(&session, &coordinates, tree, depth),
        Command::Resolve {
            coordinates,
            backtrack,
        } => resolve::exec(&session, &coordinates, backtrack),
        Command::Conflicts => conflicts::exec(&session),
        Command::Dependents { coordinate, direct } => {
            dependents::exec(&session, &coordinate, direct)
        }
        Command::Refresh => refresh::exec(&session),
    }
}

/// A loaded store file and the depot opened over it.
pub struct Session {
    pub path: PathBuf,
    pub store: Arc<InMemoryStore>,
    pub depot: Depot,
}

impl Session {
    fn open(store_arg: Option<&Path>) -> DepotResult<Self> {
        let mut config = DepotConfig::load()?;
        let path = match store_arg {
            Some(p) => p.to_path_buf(),
            None => config.store.path.as_ref().map(PathBuf::from).ok_or_else(|| {
                DepotError::Config {
                    message: "No store file given: pass --store or set [store] path in config.toml"
                        .to_string(),
                }
            })?,
        };

        let store = Arc::new(InMemoryStore::load(&path)?);
        progress::status("Loaded", &format!("{} coordinates from {}", store.len(), path.display()));

        let eager = config.cache.eager;
        config.cache.eager = false;
        let depot = Depot::open(store.clone(), &config)?;
        if eager {
            let pb = progress::spinner("Building dependency cache...");
            let summary = depot.build_cache();
            pb.finish_and_clear();
            if summary.failed > 0 {
                progress::status_warn(
                    "Cached",
                    &format!(
                        "{} coordinates, {} with unresolvable dependencies",
                        summary.scanned, summary.failed
                    ),
                );
            } else {
                progress::status("Cached", &format!("{} coordinates", summary.scanned));
            }
        }

        Ok(Self { path, store, depot })
    }
}

/// Parse a `group:artifact:version` argument.
pub fn parse_coordinate(s: &str) -> DepotResult<ProjectVersion> {
    ProjectVersion::parse(s).ok_or_else(|| {
        DepotError::Generic {
            message: format!("Invalid coordinate '{s}': expected group:artifact:version"),
        }
        .into()
    })
}

pub fn parse_coordinates(items: &[String]) -> DepotResult<Vec<ProjectVersion>> {
    items.iter().map(|s| parse_coordinate(s)).collect()
}
