//! Package references (`path` or `path@version`) and version constraints.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Sentinel version meaning "resolve to the newest release now".
pub const LATEST: &str = "latest";

/// A domain-qualified path with at least two more segments and an explicit
/// version, e.g. `golang.org/x/tools/cmd/stringer@v0.20.0`.
static ADHOC_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-a-zA-Z0-9:%._+~#=]{2,256}\.[a-z]{2,6}(/[-a-zA-Z0-9:%_+.~#?&=]+){2,}@[-a-zA-Z0-9.+]+$")
        .expect("ad-hoc reference pattern is valid")
});

/// Requested version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionConstraint {
    /// A concrete version string such as `v1.2.3`.
    Pinned(String),
    /// Resolve the newest acceptable version.
    Latest,
}

impl VersionConstraint {
    /// Parse the text after `@`. Empty text and `latest` both mean [`VersionConstraint::Latest`].
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == LATEST {
            VersionConstraint::Latest
        } else {
            VersionConstraint::Pinned(s.to_string())
        }
    }

    /// The pinned version, if any.
    pub fn pinned(&self) -> Option<&str> {
        match self {
            VersionConstraint::Pinned(v) => Some(v),
            VersionConstraint::Latest => None,
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, VersionConstraint::Latest)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Pinned(v) => f.write_str(v),
            VersionConstraint::Latest => f.write_str(LATEST),
        }
    }
}

/// A package path with its requested version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub path: String,
    pub version: VersionConstraint,
}

impl PackageRef {
    pub fn new(path: impl Into<String>, version: VersionConstraint) -> Self {
        PackageRef {
            path: path.into(),
            version,
        }
    }

    /// Parse `path` or `path@version`.
    pub fn parse(s: &str) -> Self {
        match s.trim().split_once('@') {
            Some((path, version)) => PackageRef::new(path, VersionConstraint::parse(version)),
            None => PackageRef::new(s.trim(), VersionConstraint::Latest),
        }
    }

    /// Whether the text carried an explicit `@` suffix.
    pub fn has_version_suffix(s: &str) -> bool {
        s.contains('@')
    }

    /// The command name this package installs as.
    pub fn base_name(&self) -> &str {
        base_name(&self.path)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.version)
    }
}

/// Name of the binary `go install` produces for a package path: the last
/// segment, or the one before it when the last is a major-version suffix
/// such as `v2`.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    let mut segments = trimmed.rsplit('/');
    let last = segments.next().unwrap_or(trimmed);
    match segments.next() {
        Some(parent) if is_major_version_suffix(last) => parent,
        _ => last,
    }
}

fn is_major_version_suffix(segment: &str) -> bool {
    match segment.strip_prefix('v') {
        Some(n) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => {
            !n.starts_with('0') && n != "1"
        }
        _ => false,
    }
}

/// Whether `s` is a fully-qualified, versioned package reference that can be
/// installed without a manifest entry.
pub fn is_adhoc_reference(s: &str) -> bool {
    ADHOC_REFERENCE.is_match(s.trim())
}
