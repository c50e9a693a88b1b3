//! Implementation of `gobin go-run`: build once, run many times.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::build_cache::{BuildCache, BuildCacheOptions};
use crate::builder::fingerprint::{classify_target, BuildInfo, BuildTarget};
use crate::builder::no_cache::build_uncached;
use crate::builder::toolchain::Toolchain;
use crate::core::gomod::{find_go_mod, GoMod};
use crate::core::package_ref::PackageRef;
use crate::util::process::{exit_code, ProcessBuilder};
use crate::util::GlobalContext;

/// Cache directory created next to `go.mod` for version-less package builds.
pub const MODULE_CACHE_DIR: &str = ".gobin-run-cache";

/// Arguments of one `go-run` invocation.
#[derive(Debug, Clone, Default)]
pub struct GoRunOptions {
    /// `go build` flags followed by the target.
    pub build_args: Vec<String>,
    /// Arguments for the built program.
    pub program_args: Vec<String>,
}

/// Where a cacheable build will come from.
#[derive(Debug)]
enum Plan {
    Files {
        info: BuildInfo,
    },
    Package {
        info: BuildInfo,
        path: String,
        version: String,
        flags: Vec<String>,
    },
}

/// Build (or reuse) the target and run it. Returns the program's exit code.
pub fn go_run(ctx: &GlobalContext, toolchain: &dyn Toolchain, opts: &GoRunOptions) -> Result<i32> {
    let target = classify_target(&opts.build_args)?;
    if target == BuildTarget::Uncacheable {
        let build = build_uncached(toolchain, &opts.build_args)?;
        return run_binary(build.binary(), &opts.program_args);
    }

    let go_version = toolchain.env_info()?.version;
    let (root, plan) = plan(ctx, &go_version, target)?;
    let cache = BuildCache::new(
        toolchain,
        BuildCacheOptions::from_config(root, ctx.config()),
    );

    if let Some(stats) = cache.maybe_sweep() {
        tracing::debug!(
            "swept {}: {} removed, {} kept",
            cache.root().display(),
            stats.removed,
            stats.kept
        );
    }

    let binary = match &plan {
        Plan::Files { info } => cache.ensure_files(info, &opts.build_args)?,
        Plan::Package {
            info,
            path,
            version,
            flags,
        } => cache.ensure_package(info, path, version, flags)?,
    };

    run_binary(&binary, &opts.program_args)
}

fn plan(ctx: &GlobalContext, go_version: &str, target: BuildTarget) -> Result<(PathBuf, Plan)> {
    match target {
        BuildTarget::Files { files, build_args } => Ok((
            ctx.build_cache_root(),
            Plan::Files {
                info: BuildInfo::new(go_version, build_args, None, files),
            },
        )),
        BuildTarget::Package {
            reference,
            build_args,
        } => {
            let (root, path, version) = if PackageRef::has_version_suffix(&reference) {
                let r = PackageRef::parse(&reference);
                (ctx.build_cache_root(), r.path, r.version.to_string())
            } else {
                let (module_root, version) = module_version(ctx.cwd(), &reference)?;
                (module_root.join(MODULE_CACHE_DIR), reference, version)
            };
            let info = BuildInfo::new(
                go_version,
                build_args.clone(),
                Some(format!("{}@{}", path, version)),
                Vec::new(),
            );
            Ok((
                root,
                Plan::Package {
                    info,
                    path,
                    version,
                    flags: build_args,
                },
            ))
        }
        BuildTarget::Uncacheable => anyhow::bail!("target cannot be cached"),
    }
}

/// The module root and required version for a version-less package.
fn module_version(cwd: &Path, package: &str) -> Result<(PathBuf, String)> {
    let go_mod = find_go_mod(cwd).with_context(|| {
        format!(
            "`{}` has no version and {} is not inside a Go module",
            package,
            cwd.display()
        )
    })?;
    let version = GoMod::load(&go_mod)?
        .version_for_package(package)
        .map(str::to_string)
        .with_context(|| format!("{} does not require `{}`", go_mod.display(), package))?;
    let root = go_mod.parent().unwrap_or(cwd).to_path_buf();
    Ok((root, version))
}

fn run_binary(binary: &Path, args: &[String]) -> Result<i32> {
    let status = ProcessBuilder::new(binary)
        .args(args)
        .status()
        .with_context(|| format!("failed to run {}", binary.display()))?;
    Ok(exit_code(status))
}
