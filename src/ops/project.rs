//! The configuration a manifest-driven command works against.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::locator::{locate, ConfigDirs, LocateOptions, Scope};
use crate::core::manifest::Manifest;
use crate::ops::install::InstallOptions;
use crate::util::GlobalContext;

/// A located configuration directory with its manifest and install settings.
#[derive(Debug, Clone)]
pub struct Project {
    dirs: ConfigDirs,
    manifest: Manifest,
    install: InstallOptions,
}

impl Project {
    /// Locate the configuration for this invocation and load it. The
    /// project's `config.toml` is merged into `ctx`.
    pub fn open(ctx: &mut GlobalContext, global: bool) -> Result<Self> {
        let dirs = locate(&LocateOptions::from_context(ctx, global))?;
        ctx.load_project_config(&dirs.config_dir);

        let manifest = Manifest::load(&dirs.config_dir).with_context(|| {
            format!("failed to load manifest in {}", dirs.config_dir.display())
        })?;
        let install = InstallOptions::new(&dirs.install_dir)
            .with_alias_mode(ctx.config().alias_mode());

        Ok(Project {
            dirs,
            manifest,
            install,
        })
    }

    pub fn from_parts(dirs: ConfigDirs, manifest: Manifest, install: InstallOptions) -> Self {
        Project {
            dirs,
            manifest,
            install,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.dirs.config_dir
    }

    pub fn install_dir(&self) -> &Path {
        &self.install.install_dir
    }

    pub fn scope(&self) -> Scope {
        self.dirs.scope
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }

    pub fn install_options(&self) -> &InstallOptions {
        &self.install
    }
}

#[cfg(test)]
pub(crate) fn test_project(fixture: &crate::test_support::ProjectFixture) -> Project {
    let dirs = ConfigDirs {
        config_dir: fixture.root().to_path_buf(),
        install_dir: fixture.install_dir(),
        scope: Scope::Local,
    };
    let manifest = Manifest::load(fixture.root()).unwrap();
    let install = InstallOptions::new(fixture.install_dir());
    Project::from_parts(dirs, manifest, install)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ProjectFixture;
    use crate::util::config::{AliasMode, Config};

    #[test]
    fn test_open_from_subdirectory() {
        let p = ProjectFixture::with_manifest("example.org/tools/cmd/foo@v1.0.0\n");
        p.write(".gobin/config.toml", "[install]\nalias = \"dispatcher\"\n");
        let sub = p.root().join("src").join("pkg");
        std::fs::create_dir_all(&sub).unwrap();

        let mut ctx = GlobalContext::with_dirs(&sub, p.root()).with_config(Config::default());
        let project = Project::open(&mut ctx, false).unwrap();

        assert_eq!(project.config_dir(), p.root());
        assert_eq!(project.install_dir(), p.install_dir());
        assert_eq!(project.scope(), Scope::Local);
        assert_eq!(project.manifest().entries().len(), 1);
        assert_eq!(project.install_options().alias_mode, AliasMode::Dispatcher);
    }

    #[test]
    fn test_open_without_config_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut ctx = GlobalContext::with_dirs(tmp.path(), tmp.path());
        let err = Project::open(&mut ctx, false).unwrap_err();
        assert!(err.downcast_ref::<crate::core::GobinError>().is_some());
    }
}
