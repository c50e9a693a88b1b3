//! `gobin go-run` command

use anyhow::Result;

use crate::cli::GoRunArgs;
use gobin::builder::toolchain::{detect_go, GoToolchain};
use gobin::ops::go_run::{go_run, GoRunOptions};
use gobin::util::GlobalContext;

pub fn execute(args: GoRunArgs) -> Result<i32> {
    let ctx = GlobalContext::new()?;
    let toolchain = GoToolchain::new(detect_go(ctx.env())?);

    let opts = GoRunOptions {
        build_args: args.build_args,
        program_args: args.program_args,
    };
    go_run(&ctx, &toolchain, &opts)
}
