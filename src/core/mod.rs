//! Core data structures for gobin.
//!
//! This module contains the foundational types used throughout gobin:
//! - Package references and version constraints
//! - The Gobinfile manifest and its lock file
//! - Configuration directory discovery
//! - The error taxonomy

pub mod error;
pub mod gomod;
pub mod locator;
pub mod lockfile;
pub mod manifest;
pub mod package_ref;

pub use error::{GobinError, Result};
pub use locator::{locate, ConfigDirs, LocateOptions, Scope};
pub use lockfile::{LockEntry, LockFormat, LockMap};
pub use manifest::{Manifest, ManifestEntry};
pub use package_ref::{PackageRef, VersionConstraint};
