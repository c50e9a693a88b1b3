//! `gobin apply` command

use anyhow::Result;

use super::Session;
use gobin::ops::gobin_install::apply;

pub fn execute(global: bool) -> Result<()> {
    let mut session = Session::open(global)?;
    let installed = apply(&session.toolchain, &mut session.project)?;
    super::install::report(&installed);
    Ok(())
}
