//! Finding the configuration and install directories.
//!
//! In local mode the nearest ancestor holding a Gobinfile or lock file owns
//! the invocation; binaries go to `<that dir>/.gobin`. A `go.mod` on the way
//! up is remembered and used only if no Gobinfile turns up at all. Global
//! mode uses the home directory and `$GOBIN` (or `~/go/bin`).

use std::path::{Path, PathBuf};

use crate::core::error::{GobinError, Result};
use crate::core::manifest::{JSON_LOCK_SUFFIX, LOCK_SUFFIX, MANIFEST_NAMES};
use crate::util::context::GlobalContext;

/// Install directory below a local configuration directory.
pub const LOCAL_INSTALL_DIR: &str = ".gobin";

/// File marking a Go module root.
pub const MODULE_MARKER: &str = "go.mod";

/// Global install directory relative to home when `GOBIN` is unset.
pub const GLOBAL_BIN_SUBDIR: [&str; 2] = ["go", "bin"];

/// Whether the configuration is per-project or per-user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Global,
}

/// Inputs for [`locate`].
#[derive(Debug, Clone)]
pub struct LocateOptions {
    /// Directory the upward search starts from (local mode).
    pub start_dir: PathBuf,
    /// Use the home directory instead of searching.
    pub global: bool,
    pub home_dir: PathBuf,
    /// Install directory for global mode, typically `$GOBIN`.
    pub install_dir_override: Option<PathBuf>,
}

impl LocateOptions {
    pub fn from_context(ctx: &GlobalContext, global: bool) -> Self {
        LocateOptions {
            start_dir: ctx.cwd().to_path_buf(),
            global,
            home_dir: ctx.home().to_path_buf(),
            install_dir_override: ctx.env().gobin.clone(),
        }
    }
}

/// Result of [`locate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDirs {
    pub config_dir: PathBuf,
    pub install_dir: PathBuf,
    pub scope: Scope,
}

/// Find the configuration directory and install directory.
pub fn locate(opts: &LocateOptions) -> Result<ConfigDirs> {
    if opts.global {
        let install_dir = opts.install_dir_override.clone().unwrap_or_else(|| {
            GLOBAL_BIN_SUBDIR
                .iter()
                .fold(opts.home_dir.clone(), |dir, part| dir.join(part))
        });
        return Ok(ConfigDirs {
            config_dir: opts.home_dir.clone(),
            install_dir,
            scope: Scope::Global,
        });
    }

    let mut module_root: Option<&Path> = None;
    for dir in opts.start_dir.ancestors() {
        if has_config_file(dir) {
            tracing::debug!("configuration directory: {}", dir.display());
            return Ok(local(dir));
        }
        if module_root.is_none() && dir.join(MODULE_MARKER).is_file() {
            module_root = Some(dir);
        }
    }

    match module_root {
        Some(dir) => {
            tracing::debug!("no Gobinfile found, using module root {}", dir.display());
            Ok(local(dir))
        }
        None => Err(GobinError::ConfigNotFound {
            start: opts.start_dir.clone(),
        }),
    }
}

fn local(dir: &Path) -> ConfigDirs {
    ConfigDirs {
        config_dir: dir.to_path_buf(),
        install_dir: dir.join(LOCAL_INSTALL_DIR),
        scope: Scope::Local,
    }
}

fn has_config_file(dir: &Path) -> bool {
    MANIFEST_NAMES.iter().any(|name| {
        [String::new(), LOCK_SUFFIX.to_string(), JSON_LOCK_SUFFIX.to_string()]
            .iter()
            .any(|suffix| dir.join(format!("{}{}", name, suffix)).is_file())
    })
}
