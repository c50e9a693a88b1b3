//! Test utilities and fakes for gobin unit tests.
//!
//! [`FakeToolchain`] stands in for `go`: it answers version queries from a
//! table, "installs" small shell scripts, and records every call so tests can
//! assert how often the real toolchain would have been hit.
//!
//! # Example
//!
//! ```rust,ignore
//! let toolchain = FakeToolchain::new().with_latest("example.org/owner/repo", "v1.2.0");
//! // ... exercise the code under test ...
//! assert_eq!(toolchain.count("install"), 1);
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

pub use fixtures::*;

use crate::builder::toolchain::{EnvInfo, InstallRequest, Toolchain};
use crate::core::error::{GobinError, Result};

/// Version reported by [`FakeToolchain::env_info`].
pub const FAKE_GO_VERSION: &str = "go1.22.0";

/// Recording stand-in for the Go toolchain.
#[derive(Debug, Default)]
pub struct FakeToolchain {
    version: String,
    latest: HashMap<String, String>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        FakeToolchain {
            version: FAKE_GO_VERSION.to_string(),
            ..FakeToolchain::default()
        }
    }

    /// Report `version` as the toolchain version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Answer `module@latest` queries with `version`.
    pub fn with_latest(mut self, module: impl Into<String>, version: impl Into<String>) -> Self {
        self.latest.insert(module.into(), version.into());
        self
    }

    /// Make installs of `target` fail with `stderr`.
    pub fn with_install_failure(mut self, target: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.failures.insert(target.into(), stderr.into());
        self
    }

    /// Every call so far, as `"<op> <argument>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls of one kind (`"list"`, `"install"`, `"build"`).
    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

/// Write an executable script that prints `label` and its arguments.
pub fn write_fake_binary(path: &Path, label: &str) -> std::io::Result<()> {
    std::fs::write(path, format!("#!/bin/sh\necho {} \"$@\"\n", label))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

impl Toolchain for FakeToolchain {
    fn env_info(&self) -> Result<EnvInfo> {
        Ok(EnvInfo {
            version: self.version.clone(),
            ..EnvInfo::default()
        })
    }

    fn latest_version(&self, module: &str) -> Result<Option<String>> {
        self.record(format!("list {}", module));
        Ok(self.latest.get(module).cloned())
    }

    fn install(&self, request: &InstallRequest<'_>) -> Result<()> {
        self.record(format!("install {}", request.target));
        if let Some(stderr) = self.failures.get(request.target) {
            return Err(GobinError::BuildFailed {
                target: request.target.to_string(),
                code: Some(1),
                output: stderr.clone(),
            });
        }

        let path = request
            .target
            .split_once('@')
            .map_or(request.target, |(path, _)| path);
        let out = request
            .out_dir
            .join(format!("{}{}", go_install_name(path), std::env::consts::EXE_SUFFIX));
        write_fake_binary(&out, request.target).map_err(|e| GobinError::io(&out, e))
    }

    fn build(&self, output: &Path, build_args: &[String]) -> Result<()> {
        self.record(format!("build {}", build_args.join(" ")));
        write_fake_binary(output, "built").map_err(|e| GobinError::io(output, e))
    }
}

/// The binary name `go install` picks: the last path element, skipping a
/// trailing `/vN` major-version element (N >= 2).
fn go_install_name(path: &str) -> &str {
    let elems: Vec<&str> = path.split('/').collect();
    match elems.as_slice() {
        [.., parent, last]
            if last.len() > 1
                && last.starts_with('v')
                && last[1..].parse::<u64>().is_ok_and(|n| n >= 2)
                && !last[1..].starts_with('0') =>
        {
            *parent
        }
        [.., last] => *last,
        [] => path,
    }
}
