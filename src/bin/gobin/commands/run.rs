//! `gobin run` command

use anyhow::Result;

use super::Session;
use crate::cli::RunArgs;
use gobin::ops::gobin_run::{run, RunOptions};

pub fn execute(args: RunArgs, global: bool) -> Result<i32> {
    let mut session = Session::open(global)?;
    let opts = RunOptions::parse(session.project.manifest(), &args.args)?;
    run(&session.toolchain, &mut session.project, &opts)
}
