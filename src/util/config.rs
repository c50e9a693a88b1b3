//! Configuration file support.
//!
//! Two optional locations are read:
//! - Global: `<user config dir>/gobin/config.toml`
//! - Project: `<config dir>/.gobin/config.toml`
//!
//! Project config takes precedence over global config.
//!
//! ```toml
//! [cache]
//! cleanup_cycle = 100
//! eviction_days = 90
//! latest_rebuild_days = 30
//!
//! [install]
//! alias = "versioned"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One in this many invocations sweeps the build cache.
pub const DEFAULT_CLEANUP_CYCLE: u32 = 100;

/// Build cache entries untouched for this many days are evicted.
pub const DEFAULT_EVICTION_DAYS: u64 = 90;

/// `@latest` build cache entries older than this many days are rebuilt.
pub const DEFAULT_LATEST_REBUILD_DAYS: u64 = 30;

const DAY: u64 = 24 * 60 * 60;

/// gobin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub install: InstallConfig,
}

/// Build cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Sweep on one in `cleanup_cycle` invocations (0 disables the sweep)
    pub cleanup_cycle: Option<u32>,

    /// Age in days after which an entry is evicted
    pub eviction_days: Option<u64>,

    /// Age in days after which an `@latest` entry is rebuilt
    pub latest_rebuild_days: Option<u64>,
}

/// Install settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub alias: Option<AliasMode>,
}

/// What an unversioned command alias points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasMode {
    /// `name -> name@version`
    #[default]
    Versioned,
    /// `name -> gobin`, which dispatches on its invocation name
    Dispatcher,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.cache.cleanup_cycle.is_some() {
            self.cache.cleanup_cycle = other.cache.cleanup_cycle;
        }
        if other.cache.eviction_days.is_some() {
            self.cache.eviction_days = other.cache.eviction_days;
        }
        if other.cache.latest_rebuild_days.is_some() {
            self.cache.latest_rebuild_days = other.cache.latest_rebuild_days;
        }
        if other.install.alias.is_some() {
            self.install.alias = other.install.alias;
        }
    }

    pub fn cleanup_cycle(&self) -> u32 {
        self.cache.cleanup_cycle.unwrap_or(DEFAULT_CLEANUP_CYCLE)
    }

    pub fn eviction_age(&self) -> Duration {
        Duration::from_secs(self.cache.eviction_days.unwrap_or(DEFAULT_EVICTION_DAYS) * DAY)
    }

    pub fn latest_rebuild_age(&self) -> Duration {
        Duration::from_secs(
            self.cache
                .latest_rebuild_days
                .unwrap_or(DEFAULT_LATEST_REBUILD_DAYS)
                * DAY,
        )
    }

    pub fn alias_mode(&self) -> AliasMode {
        self.install.alias.unwrap_or_default()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.gobin/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: Option<&Path>) -> Config {
    let mut config = Config::default();

    for path in [global_path, project_path].into_iter().flatten() {
        if path.exists() {
            config.merge(Config::load_or_default(path));
        }
    }

    config
}

/// Global config path (`<user config dir>/gobin/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.config_dir().join("gobin").join("config.toml"))
}

/// Project config path (`<config dir>/.gobin/config.toml`).
pub fn project_config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(".gobin").join("config.toml")
}
