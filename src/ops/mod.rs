//! High-level operations.
//!
//! This module contains the implementation of gobin commands.

pub mod bootstrap;
pub mod go_run;
pub mod gobin_install;
pub mod gobin_list;
pub mod gobin_run;
pub mod gobin_update;
pub mod install;
pub mod project;

pub use bootstrap::{alias_dispatch, reexec, BootstrapState};
pub use go_run::{go_run, GoRunOptions};
pub use gobin_install::{apply, install, Installed};
pub use gobin_list::{list, ListEntry};
pub use gobin_run::{run, RunOptions, RunTarget};
pub use gobin_update::{update, Updated};
pub use install::{ensure_installed, InstallOptions, InstalledArtifact};
pub use project::Project;
