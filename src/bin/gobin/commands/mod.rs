//! Command implementations

pub mod apply;
pub mod bootstrap;
pub mod cache;
pub mod go_run;
pub mod install;
pub mod list;
pub mod run;
pub mod update;

use anyhow::Result;

use gobin::builder::toolchain::{detect_go, GoToolchain, Toolchain};
use gobin::ops::Project;
use gobin::util::GlobalContext;

/// Everything a manifest-driven command needs.
pub struct Session {
    pub toolchain: GoToolchain,
    pub project: Project,
}

impl Session {
    pub fn open(global: bool) -> Result<Self> {
        let mut ctx = GlobalContext::new()?;
        let toolchain = GoToolchain::new(detect_go(ctx.env())?);
        let project = open_project(&mut ctx, Some(&toolchain), global)?;
        Ok(Session { toolchain, project })
    }
}

/// Locate and load the project. In global mode without `GOBIN`, the
/// toolchain's own binary directory is the install directory.
pub fn open_project(
    ctx: &mut GlobalContext,
    toolchain: Option<&dyn Toolchain>,
    global: bool,
) -> Result<Project> {
    if global && ctx.env().gobin.is_none() {
        let bin_dir = toolchain
            .and_then(|t| t.env_info().ok())
            .and_then(|info| info.bin_dir());
        if let Some(dir) = bin_dir {
            let mut env = ctx.env().clone();
            env.gobin = Some(dir);
            *ctx = ctx.clone().with_env(env);
        }
    }
    Project::open(ctx, global)
}
