//! Implementation of `gobin list`.

use std::fmt;

use crate::core::manifest::Manifest;
use crate::core::package_ref::VersionConstraint;

/// A manifest entry with its locked version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub package_path: String,
    pub requested: VersionConstraint,
    pub locked: Option<String>,
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} -> {}",
            self.package_path,
            self.requested,
            self.locked.as_deref().unwrap_or("undefined")
        )
    }
}

/// Entries in manifest order.
pub fn list(manifest: &Manifest) -> Vec<ListEntry> {
    manifest
        .entries()
        .iter()
        .map(|entry| ListEntry {
            package_path: entry.package_path.clone(),
            requested: entry.constraint.clone(),
            locked: manifest.lock().get(&entry.package_path).map(str::to_string),
        })
        .collect()
}
