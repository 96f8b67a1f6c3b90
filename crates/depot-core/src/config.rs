use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use depot_util::errors::DepotError;

/// Global configuration loaded from `~/.depot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepotConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Store settings from `[store]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON store file used when none is given on the command line.
    #[serde(default)]
    pub path: Option<String>,
}

/// Compatible-version resolver settings from `[resolver]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_backtrack_depth", rename = "backtrack-depth")]
    pub backtrack_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            backtrack_depth: default_backtrack_depth(),
        }
    }
}

fn default_backtrack_depth() -> usize {
    3
}

/// Dependency cache settings from `[cache]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Build the dependency cache from the whole store at startup.
    #[serde(default = "default_eager")]
    pub eager: bool,
    /// Worker threads for corpus-wide scans. Defaults to the rayon global pool.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            eager: default_eager(),
            threads: None,
        }
    }
}

fn default_eager() -> bool {
    true
}

impl DepotConfig {
    /// Load the global configuration, or return defaults if the file doesn't exist.
    pub fn load() -> Result<Self, DepotError> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path, or return defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, DepotError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| DepotError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| DepotError::Config {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the depot data directory: `$DEPOT_HOME`, else `~/.depot/`.
pub fn dirs_path() -> PathBuf {
    if let Ok(home) = std::env::var("DEPOT_HOME") {
        return PathBuf::from(home);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".depot")
}
