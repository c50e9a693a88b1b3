//! Builds that bypass the cache.
//!
//! Used when the target cannot be keyed (a relative package inside a
//! module, say). The binary lives in a fresh temporary directory that is
//! removed when the build handle is dropped, or on SIGINT/SIGTERM. The
//! signal does not end gobin: the program it runs gets the same signal from
//! the terminal and its exit status is still reported.

use std::path::{Path, PathBuf};

use crate::builder::build_cache::artifact_file_name;
use crate::builder::toolchain::Toolchain;
use crate::core::error::{GobinError, Result};

/// A binary in a temporary directory.
#[derive(Debug)]
pub struct UncachedBuild {
    dir: tempfile::TempDir,
    binary: PathBuf,
}

impl UncachedBuild {
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// `go build` into a new temporary directory.
pub fn build_uncached(toolchain: &dyn Toolchain, build_args: &[String]) -> Result<UncachedBuild> {
    tracing::info!("not caching this build");
    let dir = tempfile::Builder::new()
        .prefix("gobin-run-")
        .tempdir()
        .map_err(|e| GobinError::io(std::env::temp_dir(), e))?;

    remove_on_signal(dir.path().to_path_buf());

    let binary = dir.path().join(artifact_file_name());
    toolchain.build(&binary, build_args)?;
    Ok(UncachedBuild { dir, binary })
}

/// Remove `dir` when the process is interrupted or terminated.
fn remove_on_signal(dir: PathBuf) {
    let result = ctrlc::set_handler(move || {
        tracing::debug!("interrupted, removing {}", dir.display());
        let _ = std::fs::remove_dir_all(&dir);
    });
    if let Err(e) = result {
        tracing::debug!("could not install signal handler: {}", e);
    }
}
