//! Hand-over to a gobin pinned in the Gobinfile.

use std::ffi::OsString;

use anyhow::Result;

use gobin::builder::toolchain::{detect_go, GoToolchain};
use gobin::ops::bootstrap::{check, reexec, BootstrapState};
use gobin::util::GlobalContext;

/// Re-execute the pinned gobin if this is not it. Returns its exit code
/// when a hand-over happened.
pub fn maybe_switch(global: bool, args: &[OsString]) -> Result<Option<i32>> {
    let mut ctx = GlobalContext::new()?;
    if ctx.env().no_switch {
        return Ok(None);
    }

    // Problems here are reported by the command itself.
    let Ok(go) = detect_go(ctx.env()) else {
        return Ok(None);
    };
    let toolchain = GoToolchain::new(go);
    let mut project = match super::open_project(&mut ctx, Some(&toolchain), global) {
        Ok(project) => project,
        Err(e) => {
            tracing::debug!("not checking for a pinned gobin: {:#}", e);
            return Ok(None);
        }
    };

    let current = std::env::current_exe()?;
    match check(&ctx, &toolchain, &mut project, &current)? {
        BootstrapState::Canonical => Ok(None),
        BootstrapState::Switch { target } => reexec(&target, args).map(Some),
    }
}
