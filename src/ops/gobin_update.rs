//! Implementation of `gobin update`.

use anyhow::Result;

use crate::builder::toolchain::Toolchain;
use crate::core::error::GobinError;
use crate::core::manifest::ManifestEntry;
use crate::core::package_ref::VersionConstraint;
use crate::ops::install::ensure_installed;
use crate::ops::project::Project;
use crate::resolver::VersionResolver;

/// Outcome for one updated entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updated {
    pub package_path: String,
    /// Locked version before the update.
    pub previous: Option<String>,
    pub version: String,
}

impl Updated {
    pub fn changed(&self) -> bool {
        self.previous.as_deref() != Some(self.version.as_str())
    }
}

/// Re-resolve the named entries (all of them when `names` is empty),
/// ignoring the lock, install the results and rewrite the lock file.
///
/// Entries pinned in the manifest are locked to their pin.
pub fn update(
    toolchain: &dyn Toolchain,
    project: &mut Project,
    names: &[String],
) -> Result<Vec<Updated>> {
    let entries: Vec<ManifestEntry> = if names.is_empty() {
        project.manifest().entries().to_vec()
    } else {
        names
            .iter()
            .map(|name| {
                project
                    .manifest()
                    .lookup(name)?
                    .cloned()
                    .ok_or_else(|| GobinError::UnknownCommand { name: name.clone() })
            })
            .collect::<Result<_, _>>()?
    };

    let resolver = VersionResolver::new(toolchain);
    let mut updated = Vec::with_capacity(entries.len());

    for entry in &entries {
        let previous = project
            .manifest()
            .lock()
            .get(&entry.package_path)
            .map(str::to_string);

        let version = match &entry.constraint {
            VersionConstraint::Pinned(version) => version.clone(),
            VersionConstraint::Latest => resolver.resolve(&entry.package_path, &entry.constraint)?,
        };

        ensure_installed(
            toolchain,
            project.install_options(),
            &entry.package_path,
            &version,
            entry.tags().as_deref(),
        )?;

        project.manifest_mut().lock_mut().insert_with_opts(
            entry.package_path.clone(),
            version.clone(),
            entry.build_opts(),
        );

        let u = Updated {
            package_path: entry.package_path.clone(),
            previous,
            version,
        };
        if u.changed() {
            tracing::info!(
                "{} {} -> {}",
                u.package_path,
                u.previous.as_deref().unwrap_or("(none)"),
                u.version
            );
        }
        updated.push(u);
    }

    project.manifest().save_lockfile()?;
    Ok(updated)
}
