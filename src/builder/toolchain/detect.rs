//! Toolchain detection functions.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use crate::core::error::{GobinError, Result};
use crate::util::context::EnvOverrides;
use crate::util::process::find_executable;

/// Locate the `go` command.
///
/// `$GOROOT/bin/go` is preferred so that a project pinned to a specific SDK
/// keeps using it even when another `go` comes first on `PATH`.
pub fn detect_go(env: &EnvOverrides) -> Result<PathBuf> {
    if let Some(goroot) = env.goroot.as_deref() {
        let candidate = goroot_go(goroot);
        if candidate.is_file() {
            tracing::debug!("using go from GOROOT: {}", candidate.display());
            return Ok(candidate);
        }
        tracing::debug!("GOROOT set but {} does not exist", candidate.display());
    }

    if let Some(path) = find_executable("go") {
        tracing::debug!("using go from PATH: {}", path.display());
        return Ok(path);
    }

    Err(GobinError::ToolchainUnavailable {
        message: "`go` was not found in GOROOT/bin or on PATH".to_string(),
    })
}

fn goroot_go(goroot: &Path) -> PathBuf {
    goroot.join("bin").join(format!("go{}", EXE_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_goroot_is_preferred() {
        let tmp = TempDir::new().unwrap();
        let go = goroot_go(tmp.path());
        std::fs::create_dir_all(go.parent().unwrap()).unwrap();
        std::fs::write(&go, "").unwrap();

        let env = EnvOverrides {
            goroot: Some(tmp.path().to_path_buf()),
            ..EnvOverrides::default()
        };
        assert_eq!(detect_go(&env).unwrap(), go);
    }

    #[test]
    fn test_missing_goroot_binary_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let env = EnvOverrides {
            goroot: Some(tmp.path().to_path_buf()),
            ..EnvOverrides::default()
        };
        match detect_go(&env) {
            Ok(path) => assert_ne!(path, goroot_go(tmp.path())),
            Err(e) => assert!(matches!(e, GobinError::ToolchainUnavailable { .. })),
        }
    }
}
