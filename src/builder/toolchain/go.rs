//! `go` subprocess implementation.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::OnceLock;

use serde::Deserialize;

use super::{EnvInfo, InstallRequest, Toolchain};
use crate::core::error::{GobinError, Result};
use crate::util::process::ProcessBuilder;

/// Output of `go list -m -json`.
#[derive(Debug, Deserialize)]
struct ModuleInfo {
    #[serde(rename = "Version", default)]
    version: String,
}

/// The Go toolchain at a fixed path.
#[derive(Debug)]
pub struct GoToolchain {
    go: PathBuf,
    env: OnceLock<EnvInfo>,
}

impl GoToolchain {
    pub fn new(go: impl Into<PathBuf>) -> Self {
        GoToolchain {
            go: go.into(),
            env: OnceLock::new(),
        }
    }

    fn command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.go)
    }

    fn run(&self, pb: &ProcessBuilder) -> Result<Output> {
        pb.exec().map_err(|e| GobinError::ToolchainUnavailable {
            message: format!("failed to run `{}`: {}", pb.display_command(), e),
        })
    }

    fn query_env(&self) -> Result<EnvInfo> {
        let pb = self
            .command()
            .args(["env", "-json", "GOVERSION", "GOBIN", "GOPATH"]);
        let output = self.run(&pb)?;
        if !output.status.success() {
            return Err(GobinError::ToolchainUnavailable {
                message: format!(
                    "`{}` failed: {}",
                    pb.display_command(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let mut info: EnvInfo =
            serde_json::from_slice(&output.stdout).map_err(|e| GobinError::ToolchainUnavailable {
                message: format!("unexpected `go env` output: {}", e),
            })?;

        // GOVERSION is missing from `go env` before Go 1.16.
        if info.version.is_empty() {
            let output = self.run(&self.command().arg("version"))?;
            info.version = parse_go_version(&String::from_utf8_lossy(&output.stdout))
                .unwrap_or_default()
                .to_string();
        }

        Ok(info)
    }
}

/// `go version go1.22.3 linux/amd64` -> `go1.22.3`
fn parse_go_version(output: &str) -> Option<&str> {
    output
        .split_whitespace()
        .nth(2)
        .filter(|v| v.starts_with("go"))
}

fn build_failed(target: &str, output: &Output) -> GobinError {
    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    if text.trim().is_empty() {
        text = String::from_utf8_lossy(&output.stdout).into_owned();
    }
    GobinError::BuildFailed {
        target: target.to_string(),
        code: output.status.code(),
        output: text,
    }
}

impl Toolchain for GoToolchain {
    fn env_info(&self) -> Result<EnvInfo> {
        if let Some(info) = self.env.get() {
            return Ok(info.clone());
        }
        let info = self.query_env()?;
        tracing::debug!("go version: {}", info.version);
        Ok(self.env.get_or_init(|| info).clone())
    }

    fn latest_version(&self, module: &str) -> Result<Option<String>> {
        let pb = self
            .command()
            .args(["list", "-m", "-json"])
            .arg(format!("{}@latest", module))
            .env("GO111MODULE", "on");
        let output = self.run(&pb)?;

        if !output.status.success() {
            tracing::debug!(
                "`{}` failed: {}",
                pb.display_command(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        match serde_json::from_slice::<ModuleInfo>(&output.stdout) {
            Ok(info) if !info.version.is_empty() => Ok(Some(info.version)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::debug!("unexpected `go list` output for {}: {}", module, e);
                Ok(None)
            }
        }
    }

    fn install(&self, request: &InstallRequest<'_>) -> Result<()> {
        let pb = self
            .command()
            .arg("install")
            .args(request.build_args)
            .arg(request.target)
            .env("GOBIN", request.out_dir);
        tracing::info!("go install {}", request.target);

        let output = self.run(&pb)?;
        if !output.status.success() {
            return Err(build_failed(request.target, &output));
        }
        Ok(())
    }

    fn build(&self, output_path: &Path, build_args: &[String]) -> Result<()> {
        let pb = self
            .command()
            .arg("build")
            .arg("-o")
            .arg(output_path)
            .args(build_args);

        let output = self.run(&pb)?;
        if !output.status.success() {
            let target = build_args.last().map(String::as_str).unwrap_or(".");
            return Err(build_failed(target, &output));
        }
        Ok(())
    }
}
