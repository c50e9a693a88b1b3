//! Version resolution.
//!
//! Pinned requests pass through untouched. `latest` requests are turned into
//! a concrete version by asking the toolchain about each module-path
//! candidate in turn; the first compatible answer wins. Only this path
//! touches the network.

pub mod candidates;

pub use candidates::{is_incompatible, module_candidates};

use crate::builder::toolchain::Toolchain;
use crate::core::error::{GobinError, Result};
use crate::core::package_ref::VersionConstraint;

/// Resolves version constraints through a toolchain.
pub struct VersionResolver<'a> {
    toolchain: &'a dyn Toolchain,
}

impl<'a> VersionResolver<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        VersionResolver { toolchain }
    }

    /// Resolve `constraint` for `package_path` to a concrete version.
    pub fn resolve(&self, package_path: &str, constraint: &VersionConstraint) -> Result<String> {
        match constraint {
            VersionConstraint::Pinned(version) => Ok(version.clone()),
            VersionConstraint::Latest => self.resolve_latest(package_path),
        }
    }

    fn resolve_latest(&self, package_path: &str) -> Result<String> {
        let candidates = module_candidates(package_path);

        for module in &candidates {
            match self.toolchain.latest_version(module)? {
                Some(version) if is_incompatible(&version) => {
                    tracing::debug!("skipping {}@{} (incompatible)", module, version);
                }
                Some(version) => {
                    tracing::debug!("resolved {} via {} to {}", package_path, module, version);
                    return Ok(version);
                }
                None => tracing::debug!("no version for module candidate {}", module),
            }
        }

        Err(GobinError::VersionResolutionFailed {
            package: package_path.to_string(),
            candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeToolchain;

    #[test]
    fn test_pinned_makes_no_calls() {
        let toolchain = FakeToolchain::new();
        let resolver = VersionResolver::new(&toolchain);

        let v = resolver
            .resolve(
                "example.org/tools/cmd/foo",
                &VersionConstraint::Pinned("v1.2.3".to_string()),
            )
            .unwrap();

        assert_eq!(v, "v1.2.3");
        assert!(toolchain.calls().is_empty());
    }

    #[test]
    fn test_latest_uses_longest_module() {
        let toolchain = FakeToolchain::new()
            .with_latest("example.org/owner/repo", "v1.9.0")
            .with_latest("example.org/owner/repo/v2", "v2.1.0");
        let resolver = VersionResolver::new(&toolchain);

        let v = resolver
            .resolve("example.org/owner/repo/v2/cmd/tool", &VersionConstraint::Latest)
            .unwrap();

        assert_eq!(v, "v2.1.0");
        assert_eq!(
            toolchain.calls(),
            vec![
                "list example.org/owner/repo/v2/cmd/tool",
                "list example.org/owner/repo/v2/cmd",
                "list example.org/owner/repo/v2",
            ]
        );
    }

    #[test]
    fn test_incompatible_is_skipped() {
        let toolchain = FakeToolchain::new()
            .with_latest("example.org/owner/repo/cmd", "v3.0.0+incompatible")
            .with_latest("example.org/owner/repo", "v1.4.2");
        let resolver = VersionResolver::new(&toolchain);

        let v = resolver
            .resolve("example.org/owner/repo/cmd", &VersionConstraint::Latest)
            .unwrap();
        assert_eq!(v, "v1.4.2");
    }

    #[test]
    fn test_exhausted_candidates() {
        let toolchain = FakeToolchain::new();
        let resolver = VersionResolver::new(&toolchain);

        let err = resolver
            .resolve("example.org/owner/repo/cmd", &VersionConstraint::Latest)
            .unwrap_err();
        match err {
            GobinError::VersionResolutionFailed { candidates, .. } => {
                assert_eq!(candidates.len(), 2)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let toolchain = FakeToolchain::new().with_latest("example.org/owner/repo", "v0.7.0");
        let resolver = VersionResolver::new(&toolchain);

        let a = resolver
            .resolve("example.org/owner/repo/cmd/x", &VersionConstraint::Latest)
            .unwrap();
        let b = resolver
            .resolve("example.org/owner/repo/cmd/x", &VersionConstraint::Latest)
            .unwrap();
        assert_eq!(a, b);
    }
}
