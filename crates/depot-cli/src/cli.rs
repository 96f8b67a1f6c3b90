//! CLI argument definitions for Depot.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depot",
    version,
    about = "Dependency resolution over an artifact metadata depot",
    long_about = "Depot computes transitive dependency closures, dependency reports with \
                  version conflicts, and compatible version sets over a store of \
                  group:artifact:version coordinates."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON store file (defaults to `[store] path` in config.toml)
    #[arg(short, long, global = true, env = "DEPOT_STORE")]
    pub store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the dependencies of a coordinate
    Deps {
        /// Coordinate as group:artifact:version
        coordinate: String,
        /// Only declared direct dependencies
        #[arg(long)]
        direct: bool,
    },

    /// Print the dependency report for one or more coordinates
    Report {
        /// Coordinates as group:artifact:version
        #[arg(required = true)]
        coordinates: Vec<String>,
        /// Print an indented tree instead of JSON
        #[arg(long)]
        tree: bool,
        /// Maximum tree depth to display
        #[arg(long, requires = "tree")]
        depth: Option<usize>,
    },

    /// Pick one compatible version per requested artifact
    Resolve {
        /// Coordinates as group:artifact:version
        #[arg(required = true)]
        coordinates: Vec<String>,
        /// How many older versions of each artifact may be tried
        #[arg(short, long)]
        backtrack: Option<usize>,
    },

    /// List every coordinate whose closure has version conflicts
    Conflicts,

    /// Print the coordinates that depend on a coordinate
    Dependents {
        /// Coordinate as group:artifact:version
        coordinate: String,
        /// Only coordinates declaring it directly
        #[arg(long)]
        direct: bool,
    },

    /// Recompute every stored transitive report and save the store
    Refresh,
}

pub fn parse() -> Cli {
    Cli::parse()
}
