//! Implementation of `gobin install` and `gobin apply`.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use anyhow::Result;

use crate::builder::toolchain::Toolchain;
use crate::core::error::GobinError;
use crate::core::manifest::ManifestEntry;
use crate::core::package_ref::{is_adhoc_reference, PackageRef};
use crate::ops::install::{ensure_installed, InstalledArtifact};
use crate::ops::project::Project;
use crate::resolver::VersionResolver;

/// One installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub package_path: String,
    pub version: String,
    pub artifact: InstalledArtifact,
    /// The version was resolved from `latest` during this call.
    pub resolved: bool,
}

impl Installed {
    pub fn path(&self) -> &Path {
        &self.artifact.path
    }
}

/// Resolve and install one manifest entry.
///
/// A newly resolved version is recorded in the in-memory lock; the caller
/// decides when to save it.
pub fn install_entry(
    toolchain: &dyn Toolchain,
    project: &mut Project,
    entry: &ManifestEntry,
) -> Result<Installed> {
    let constraint = project.manifest().effective_version(entry);
    let version = VersionResolver::new(toolchain).resolve(&entry.package_path, &constraint)?;

    let resolved = constraint.is_latest();
    if resolved {
        project.manifest_mut().lock_mut().insert_with_opts(
            entry.package_path.clone(),
            version.clone(),
            entry.build_opts(),
        );
    }

    let artifact = ensure_installed(
        toolchain,
        project.install_options(),
        &entry.package_path,
        &version,
        entry.tags().as_deref(),
    )?;

    Ok(Installed {
        package_path: entry.package_path.clone(),
        version,
        artifact,
        resolved,
    })
}

/// Install a `path@version` reference that is not in the manifest. Nothing
/// is written to the lock.
pub fn install_adhoc(
    toolchain: &dyn Toolchain,
    project: &Project,
    reference: &PackageRef,
    tags: Option<&str>,
) -> Result<Installed> {
    let version = VersionResolver::new(toolchain).resolve(&reference.path, &reference.version)?;
    let artifact = ensure_installed(
        toolchain,
        project.install_options(),
        &reference.path,
        &version,
        tags,
    )?;
    Ok(Installed {
        package_path: reference.path.clone(),
        version,
        artifact,
        resolved: reference.version.is_latest(),
    })
}

/// Install the named packages and everything they require. With no names,
/// install every manifest entry.
///
/// Names are command base names, package paths, or ad-hoc `path@version`
/// references. The lock file is rewritten when a version was resolved.
pub fn install(
    toolchain: &dyn Toolchain,
    project: &mut Project,
    names: &[String],
) -> Result<Vec<Installed>> {
    let mut queue: VecDeque<String> = if names.is_empty() {
        project
            .manifest()
            .entries()
            .iter()
            .map(|e| e.package_path.clone())
            .collect()
    } else {
        names.iter().cloned().collect()
    };

    let mut seen = HashSet::new();
    let mut installed = Vec::new();

    while let Some(name) = queue.pop_front() {
        let entry = project.manifest().lookup(&name)?.cloned();
        match entry {
            Some(entry) => {
                if !seen.insert(entry.package_path.clone()) {
                    continue;
                }
                installed.push(install_entry(toolchain, project, &entry)?);
                queue.extend(entry.requires.iter().cloned());
            }
            None if is_adhoc_reference(&name) => {
                let reference = PackageRef::parse(&name);
                if !seen.insert(reference.path.clone()) {
                    continue;
                }
                installed.push(install_adhoc(toolchain, project, &reference, None)?);
            }
            None => return Err(GobinError::UnknownCommand { name }.into()),
        }
    }

    save_if_resolved(project, &installed)?;
    Ok(installed)
}

/// Install every manifest entry.
pub fn apply(toolchain: &dyn Toolchain, project: &mut Project) -> Result<Vec<Installed>> {
    install(toolchain, project, &[])
}

pub(crate) fn save_if_resolved(project: &Project, installed: &[Installed]) -> Result<()> {
    if installed.iter().any(|i| i.resolved) {
        project.manifest().save_lockfile()?;
    }
    Ok(())
}
