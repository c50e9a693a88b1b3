//! `gobin install` command

use anyhow::Result;

use super::Session;
use crate::cli::InstallArgs;
use gobin::ops::gobin_install::{install, Installed};

pub fn execute(args: InstallArgs, global: bool) -> Result<()> {
    let mut session = Session::open(global)?;
    let installed = install(&session.toolchain, &mut session.project, &args.names)?;
    report(&installed);
    Ok(())
}

pub(crate) fn report(installed: &[Installed]) {
    for item in installed {
        let status = if item.artifact.built { "Installed" } else { "Fresh" };
        eprintln!("{:>12} {}@{}", status, item.package_path, item.version);
    }
}
