//! Per-invocation context.
//!
//! Built once in `main` and passed down explicitly: the working directory,
//! the user's home, the environment overrides that were in effect at start-up,
//! and the merged configuration.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Environment variables gobin reacts to, read once at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `GOBIN`: install directory in global mode
    pub gobin: Option<PathBuf>,
    /// `NOSWITCH`: never hand over to a pinned self-install
    pub no_switch: bool,
    /// `GOBIN_VERBOSE`
    pub verbose: bool,
    /// `GOBIN_SILENT`
    pub silent: bool,
    /// `GOBIN_CACHE_DIR`: build cache root
    pub cache_dir: Option<PathBuf>,
    /// `GOROOT`: preferred toolchain location
    pub goroot: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    /// Build from an explicit variable list. Empty values count as unset.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut env = EnvOverrides::default();
        for (key, value) in vars {
            if value.is_empty() {
                continue;
            }
            match key.to_str() {
                Some("GOBIN") => env.gobin = Some(PathBuf::from(value)),
                Some("NOSWITCH") => env.no_switch = true,
                Some("GOBIN_VERBOSE") => env.verbose = true,
                Some("GOBIN_SILENT") => env.silent = true,
                Some("GOBIN_CACHE_DIR") => env.cache_dir = Some(PathBuf::from(value)),
                Some("GOROOT") => env.goroot = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        env
    }
}

/// Global context containing paths, environment and configuration.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
    home: PathBuf,
    /// Platform cache directory, parent of the default build cache root.
    user_cache: PathBuf,
    env: EnvOverrides,
    config: Config,
}

impl GlobalContext {
    /// Create a context from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let dirs = directories::BaseDirs::new().context("failed to determine home directory")?;

        let config = load_config(global_config_path().as_deref(), None);

        Ok(GlobalContext {
            cwd,
            home: dirs.home_dir().to_path_buf(),
            user_cache: dirs.cache_dir().to_path_buf(),
            env: EnvOverrides::from_env(),
            config,
        })
    }

    /// Create a context rooted at explicit directories, with no environment
    /// overrides and default configuration.
    pub fn with_dirs(cwd: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        GlobalContext {
            cwd: cwd.into(),
            user_cache: home.join(".cache"),
            home,
            env: EnvOverrides::default(),
            config: Config::default(),
        }
    }

    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Layer `<config_dir>/.gobin/config.toml` over the current configuration.
    pub fn load_project_config(&mut self, config_dir: &Path) {
        let path = project_config_path(config_dir);
        if path.exists() {
            self.config.merge(Config::load_or_default(&path));
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn env(&self) -> &EnvOverrides {
        &self.env
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Root of the content-addressed build cache.
    pub fn build_cache_root(&self) -> PathBuf {
        self.env
            .cache_dir
            .clone()
            .unwrap_or_else(|| self.user_cache.join("gobin-run-cache"))
    }

    pub fn is_verbose(&self) -> bool {
        self.env.verbose
    }

    pub fn is_silent(&self) -> bool {
        self.env.silent
    }
}
