//! The external Go toolchain.
//!
//! gobin never compiles anything itself; every version query and build is a
//! `go` subprocess. The [`Toolchain`] trait is the seam between that
//! subprocess and the caches, so tests can substitute a recording fake.
//!
//! Toolchain detection priority:
//! 1. `$GOROOT/bin/go`
//! 2. `go` on `PATH`

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::Result;

mod detect;
mod go;

pub use detect::detect_go;
pub use go::GoToolchain;

/// Environment facts reported by `go env`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvInfo {
    /// e.g. `go1.22.3`
    #[serde(rename = "GOVERSION", default)]
    pub version: String,

    #[serde(rename = "GOBIN", default)]
    pub gobin: String,

    #[serde(rename = "GOPATH", default)]
    pub gopath: String,
}

impl EnvInfo {
    /// Default binary output directory: `GOBIN`, else the first `GOPATH`
    /// entry's `bin`.
    pub fn bin_dir(&self) -> Option<PathBuf> {
        if !self.gobin.is_empty() {
            return Some(PathBuf::from(&self.gobin));
        }
        std::env::split_paths(&self.gopath)
            .find(|p| !p.as_os_str().is_empty())
            .map(|p| p.join("bin"))
    }
}

/// A `go install` invocation.
#[derive(Debug, Clone)]
pub struct InstallRequest<'a> {
    /// `path@version`
    pub target: &'a str,
    /// Directory the binary is written to (`GOBIN` for the child).
    pub out_dir: &'a Path,
    /// Flags placed before the target, e.g. `-tags netgo`.
    pub build_args: &'a [String],
}

/// Operations gobin needs from the Go toolchain.
pub trait Toolchain: Send + Sync {
    /// Report version and default directories.
    fn env_info(&self) -> Result<EnvInfo>;

    /// Latest version of `module`, as `go list -m module@latest` reports it.
    ///
    /// `Ok(None)` means the query ran but `module` is not a module (or has
    /// no releases); errors are reserved for a toolchain that cannot run.
    fn latest_version(&self, module: &str) -> Result<Option<String>>;

    /// Install a package into `request.out_dir`. The binary is named after
    /// the package's last path segment, or the one before a trailing `/vN`.
    fn install(&self, request: &InstallRequest<'_>) -> Result<()>;

    /// `go build -o output <build_args>`.
    fn build(&self, output: &Path, build_args: &[String]) -> Result<()>;
}

/// Build flags for a tag list.
pub fn tag_args(tags: Option<&str>) -> Vec<String> {
    match tags {
        Some(tags) if !tags.is_empty() => vec!["-tags".to_string(), tags.to_string()],
        _ => Vec::new(),
    }
}
