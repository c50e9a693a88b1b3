//! `gobin list` command

use anyhow::Result;

use gobin::ops::gobin_list::list;
use gobin::util::GlobalContext;

pub fn execute(global: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    let project = super::open_project(&mut ctx, None, global)?;

    for entry in list(project.manifest()) {
        println!("{}", entry);
    }
    Ok(())
}
