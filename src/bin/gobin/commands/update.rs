//! `gobin update` command

use anyhow::Result;

use super::Session;
use crate::cli::UpdateArgs;
use gobin::ops::gobin_update::update;

pub fn execute(args: UpdateArgs, global: bool) -> Result<()> {
    let mut session = Session::open(global)?;
    let updated = update(&session.toolchain, &mut session.project, &args.names)?;

    let changed = updated.iter().filter(|u| u.changed()).count();
    eprintln!("    Updating {} packages ({} changed)", updated.len(), changed);
    Ok(())
}
