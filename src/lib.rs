//! gobin - pinned, build-once installer and runner for Go programs
//!
//! This crate provides the library behind the `gobin` binary: locating the
//! Gobinfile and its lock file, resolving `latest` to concrete versions,
//! installing versioned binaries, and the content-addressed build cache
//! used by `gobin go-run`.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and fakes for gobin unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a recording stand-in for the Go toolchain and project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{GobinError, Manifest, ManifestEntry, PackageRef, VersionConstraint};
pub use resolver::VersionResolver;
pub use util::context::GlobalContext;
