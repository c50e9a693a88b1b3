//! Handing over to the gobin version pinned in the manifest.
//!
//! A manifest may list gobin itself. The running binary then checks whether
//! it *is* that pinned install; if not, it installs it and re-executes it
//! with the same arguments. `NOSWITCH` disables this and is set for the
//! re-executed child so the hand-over happens at most once.

use std::env::consts::EXE_SUFFIX;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::toolchain::Toolchain;
use crate::ops::gobin_install::{install_entry, save_if_resolved};
use crate::ops::install::SELF_COMMAND;
use crate::ops::project::Project;
use crate::util::fs::normalize_path;
use crate::util::process::{exit_code, find_executable, ProcessBuilder};
use crate::util::GlobalContext;

/// Environment variable that disables the hand-over.
pub const NO_SWITCH_VAR: &str = "NOSWITCH";

/// Whether this process should keep going or defer to another binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    /// This process is the right gobin.
    Canonical,
    /// Re-execute `target` instead.
    Switch { target: PathBuf },
}

/// Decide whether to hand over, installing the pinned gobin if needed.
pub fn check(
    ctx: &GlobalContext,
    toolchain: &dyn Toolchain,
    project: &mut Project,
    current_exe: &Path,
) -> Result<BootstrapState> {
    if ctx.env().no_switch {
        return Ok(BootstrapState::Canonical);
    }

    let Some(entry) = project
        .manifest()
        .entries()
        .iter()
        .find(|e| e.base_name() == SELF_COMMAND)
        .cloned()
    else {
        return Ok(BootstrapState::Canonical);
    };

    let installed = install_entry(toolchain, project, &entry)?;
    save_if_resolved(project, std::slice::from_ref(&installed))?;

    let current = normalize_path(current_exe);
    if current == normalize_path(installed.path()) {
        return Ok(BootstrapState::Canonical);
    }

    tracing::debug!(
        "switching from {} to {}",
        current.display(),
        installed.path().display()
    );
    Ok(BootstrapState::Switch {
        target: installed.artifact.path,
    })
}

/// Run `target` with `args` and return its exit code.
pub fn reexec(target: &Path, args: &[OsString]) -> Result<i32> {
    let status = ProcessBuilder::new(target)
        .args(args)
        .env(NO_SWITCH_VAR, "1")
        .status()
        .with_context(|| format!("failed to run {}", target.display()))?;
    Ok(exit_code(status))
}

/// The command to run when gobin was invoked through a dispatcher alias.
///
/// `argv0` names an alias sitting in a directory that also holds a `gobin`
/// binary. A bare name (invoked through `PATH`) is looked up first. gobin's
/// own names, `gobin` and the versioned `gobin@...` artifacts, never
/// dispatch.
pub fn alias_dispatch(argv0: &Path) -> Option<String> {
    alias_dispatch_with(argv0, find_executable)
}

fn alias_dispatch_with(
    argv0: &Path,
    lookup: impl FnOnce(&str) -> Option<PathBuf>,
) -> Option<String> {
    let name = argv0.file_name()?.to_str()?;
    let name = name.strip_suffix(EXE_SUFFIX).unwrap_or(name);
    if name.is_empty() || is_self_name(name) {
        return None;
    }

    let invoked = match argv0.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => argv0.to_path_buf(),
        _ => lookup(name)?,
    };
    let dir = invoked.parent()?;
    dir.join(format!("{}{}", SELF_COMMAND, EXE_SUFFIX))
        .exists()
        .then(|| name.to_string())
}

fn is_self_name(name: &str) -> bool {
    name == SELF_COMMAND
        || name
            .strip_prefix(SELF_COMMAND)
            .is_some_and(|rest| rest.starts_with('@'))
}
