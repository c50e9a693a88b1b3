//! Versioned binaries in the install directory.
//!
//! Layout:
//!
//! ```text
//! <install_dir>/foo@v1.2.3          immutable artifact
//! <install_dir>/foo@v1.2.3-1a2b3c4  same version, built with tags
//! <install_dir>/foo -> foo@v1.2.3   alias for the active version
//! ```
//!
//! An artifact is never rewritten: a new version or tag set gets a new file
//! name. `go install` runs in a private staging directory and its output is
//! renamed into place, so a racing install of the same artifact either wins
//! the rename or adopts the other process's file.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use crate::builder::toolchain::{tag_args, InstallRequest, Toolchain};
use crate::core::error::{GobinError, Result};
use crate::core::package_ref::base_name;
use crate::util::config::AliasMode;
use crate::util::fs::{rename_or_adopt, replace_symlink};
use crate::util::hash::short_hash;

/// Base name of gobin itself when it is listed in a manifest.
pub const SELF_COMMAND: &str = "gobin";

/// Hex digits of the tags hash appended to tagged artifacts.
const TAGS_HASH_LEN: usize = 7;

/// Where and how to install.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub install_dir: PathBuf,
    /// Target of the unversioned alias. Defaults to [`AliasMode::Versioned`].
    pub alias_mode: AliasMode,
}

impl InstallOptions {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        InstallOptions {
            install_dir: install_dir.into(),
            alias_mode: AliasMode::default(),
        }
    }

    pub fn with_alias_mode(mut self, alias_mode: AliasMode) -> Self {
        self.alias_mode = alias_mode;
        self
    }
}

/// An installed binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    /// `<install_dir>/<base>@<version>[-<tags hash>]`
    pub path: PathBuf,
    /// `<install_dir>/<base>`
    pub alias: PathBuf,
    /// Whether the toolchain ran to produce it.
    pub built: bool,
}

/// File name of the artifact for a package version and tag set.
pub fn artifact_name(package_path: &str, version: &str, tags: Option<&str>) -> String {
    let mut name = format!("{}@{}", base_name(package_path), version);
    if let Some(tags) = tags.filter(|t| !t.is_empty()) {
        name.push('-');
        name.push_str(&short_hash(tags, TAGS_HASH_LEN));
    }
    name.push_str(EXE_SUFFIX);
    name
}

/// Make sure `package_path@version` is installed and aliased.
///
/// `version` must be concrete. An existing artifact is returned without
/// calling the toolchain.
pub fn ensure_installed(
    toolchain: &dyn Toolchain,
    opts: &InstallOptions,
    package_path: &str,
    version: &str,
    tags: Option<&str>,
) -> Result<InstalledArtifact> {
    let install_dir = &opts.install_dir;
    std::fs::create_dir_all(install_dir).map_err(|e| GobinError::install_io(install_dir, e))?;

    let base = base_name(package_path);
    let name = artifact_name(package_path, version, tags);
    let path = install_dir.join(&name);
    let alias = install_dir.join(format!("{}{}", base, EXE_SUFFIX));

    let built = if path.is_file() {
        tracing::debug!("{} already installed", name);
        false
    } else {
        install_into(toolchain, install_dir, package_path, version, tags, &path)?;
        true
    };

    publish_alias(opts, base, &name, &alias)?;

    Ok(InstalledArtifact { path, alias, built })
}

fn install_into(
    toolchain: &dyn Toolchain,
    install_dir: &Path,
    package_path: &str,
    version: &str,
    tags: Option<&str>,
    artifact: &Path,
) -> Result<()> {
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(install_dir)
        .map_err(|e| GobinError::install_io(install_dir, e))?;

    let target = format!("{}@{}", package_path, version);
    tracing::debug!("installing {} into {}", target, staging.path().display());
    toolchain.install(&InstallRequest {
        target: &target,
        out_dir: staging.path(),
        build_args: &tag_args(tags),
    })?;

    let produced = staging
        .path()
        .join(format!("{}{}", base_name(package_path), EXE_SUFFIX));
    if !produced.is_file() {
        return Err(GobinError::install_io(
            &produced,
            std::io::Error::new(std::io::ErrorKind::NotFound, "go install produced no binary"),
        ));
    }
    rename_or_adopt(&produced, artifact).map_err(|e| GobinError::install_io(artifact, e))
}

/// Point `alias` at the artifact (or at the dispatcher). Left alone when it
/// already points there.
fn publish_alias(opts: &InstallOptions, base: &str, artifact_name: &str, alias: &Path) -> Result<()> {
    let dispatcher = format!("{}{}", SELF_COMMAND, EXE_SUFFIX);
    let use_dispatcher = opts.alias_mode == AliasMode::Dispatcher
        && base != SELF_COMMAND
        && opts.install_dir.join(&dispatcher).exists();
    let target = if use_dispatcher {
        dispatcher.as_str()
    } else {
        artifact_name
    };

    if std::fs::read_link(alias).is_ok_and(|current| current == Path::new(target)) {
        return Ok(());
    }

    match replace_symlink(Path::new(target), alias) {
        Ok(()) => Ok(()),
        // Symlinks need extra privileges on Windows.
        Err(_) if cfg!(windows) => std::fs::copy(opts.install_dir.join(target), alias)
            .map(drop)
            .map_err(|e| GobinError::install_io(alias, e)),
        Err(e) => Err(GobinError::install_io(alias, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_fake_binary, FakeToolchain, ProjectFixture};

    const FOO: &str = "example.org/tools/cmd/foo";

    fn opts(p: &ProjectFixture) -> InstallOptions {
        InstallOptions::new(p.install_dir())
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(
            artifact_name(FOO, "v1.2.3", None),
            format!("foo@v1.2.3{}", EXE_SUFFIX)
        );
        assert_eq!(artifact_name(FOO, "v1.2.3", Some("")), artifact_name(FOO, "v1.2.3", None));

        let ab = artifact_name(FOO, "v1.2.3", Some("a,b"));
        let cd = artifact_name(FOO, "v1.2.3", Some("c,d"));
        assert_ne!(ab, cd);
        assert_eq!(ab, artifact_name(FOO, "v1.2.3", Some("a,b")));
        assert!(ab.starts_with("foo@v1.2.3-"));
        assert_eq!(ab.trim_end_matches(EXE_SUFFIX).len(), "foo@v1.2.3-".len() + 7);
    }

    #[test]
    fn test_install_once() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();

        let first = ensure_installed(&toolchain, &opts(&p), FOO, "v1.2.3", None).unwrap();
        let second = ensure_installed(&toolchain, &opts(&p), FOO, "v1.2.3", None).unwrap();

        assert!(first.built);
        assert!(!second.built);
        assert_eq!(first.path, second.path);
        assert_eq!(toolchain.calls(), vec!["install example.org/tools/cmd/foo@v1.2.3"]);
        assert!(first.path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_alias_points_at_artifact() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();

        let v1 = ensure_installed(&toolchain, &opts(&p), FOO, "v1.0.0", None).unwrap();
        assert_eq!(std::fs::read_link(&v1.alias).unwrap(), Path::new("foo@v1.0.0"));

        ensure_installed(&toolchain, &opts(&p), FOO, "v2.0.0", None).unwrap();
        assert_eq!(std::fs::read_link(&v1.alias).unwrap(), Path::new("foo@v2.0.0"));

        // Both versions stay on disk.
        assert!(v1.path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_artifact_skips_toolchain() {
        let p = ProjectFixture::new();
        let dir = p.install_dir();
        std::fs::create_dir_all(&dir).unwrap();
        write_fake_binary(&dir.join("foo@v1.2.3"), "prebuilt").unwrap();
        std::os::unix::fs::symlink("foo@v1.2.3", dir.join("foo")).unwrap();
        let toolchain = FakeToolchain::new();

        let artifact = ensure_installed(&toolchain, &opts(&p), FOO, "v1.2.3", None).unwrap();

        assert!(!artifact.built);
        assert!(toolchain.calls().is_empty());
        assert_eq!(std::fs::read_link(dir.join("foo")).unwrap(), Path::new("foo@v1.2.3"));
    }

    #[test]
    fn test_major_version_package() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();

        let artifact =
            ensure_installed(&toolchain, &opts(&p), "example.org/owner/tool/v2", "v2.1.0", None)
                .unwrap();

        assert!(artifact.path.is_file());
        assert_eq!(
            artifact.path.file_name().unwrap().to_str().unwrap(),
            format!("tool@v2.1.0{}", EXE_SUFFIX)
        );
        assert_eq!(artifact.alias, p.install_dir().join(format!("tool{}", EXE_SUFFIX)));
    }

    #[test]
    fn test_tags_give_separate_artifacts() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();

        let plain = ensure_installed(&toolchain, &opts(&p), FOO, "v1.2.3", None).unwrap();
        let tagged = ensure_installed(&toolchain, &opts(&p), FOO, "v1.2.3", Some("netgo")).unwrap();

        assert_ne!(plain.path, tagged.path);
        assert_eq!(toolchain.count("install"), 2);
    }

    #[test]
    fn test_failed_install_leaves_nothing() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new()
            .with_install_failure("example.org/tools/cmd/foo@v1.2.3", "cannot find module");

        let err = ensure_installed(&toolchain, &opts(&p), FOO, "v1.2.3", None).unwrap_err();

        assert!(matches!(err, GobinError::BuildFailed { ref output, .. } if output.contains("cannot find module")));
        let leftovers: Vec<_> = std::fs::read_dir(p.install_dir()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_dispatcher_alias() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();
        let opts = opts(&p).with_alias_mode(AliasMode::Dispatcher);

        // Without gobin installed the alias falls back to the artifact.
        let foo = ensure_installed(&toolchain, &opts, FOO, "v1.0.0", None).unwrap();
        assert_eq!(std::fs::read_link(&foo.alias).unwrap(), Path::new("foo@v1.0.0"));

        let gobin = ensure_installed(&toolchain, &opts, "example.org/gobin/cmd/gobin", "v0.9.0", None)
            .unwrap();
        assert_eq!(std::fs::read_link(&gobin.alias).unwrap(), Path::new("gobin@v0.9.0"));

        ensure_installed(&toolchain, &opts, FOO, "v1.0.0", None).unwrap();
        assert_eq!(std::fs::read_link(&foo.alias).unwrap(), Path::new("gobin"));
    }
}
