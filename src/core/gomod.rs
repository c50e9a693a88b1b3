//! Minimal `go.mod` reader.
//!
//! Only the `module` line and `require` directives are understood; that is
//! all gobin needs to pin a version-less package reference to the version
//! the surrounding module already depends on.

use std::path::{Path, PathBuf};

use crate::core::error::{GobinError, Result};
use crate::core::locator::MODULE_MARKER;

/// A `require` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
}

/// The parts of a `go.mod` file gobin reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: Option<String>,
    pub requires: Vec<Require>,
}

impl GoMod {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GobinError::io(path, e))?;
        Ok(GoMod::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut gomod = GoMod::default();
        let mut in_require_block = false;

        for raw in contents.lines() {
            let line = raw.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if in_require_block {
                if line == ")" {
                    in_require_block = false;
                } else if let Some(req) = parse_require(line) {
                    gomod.requires.push(req);
                }
                continue;
            }

            let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            match verb {
                "module" => gomod.module = Some(unquote(rest).to_string()),
                "require" if rest == "(" => in_require_block = true,
                "require" => gomod.requires.extend(parse_require(rest)),
                _ => {}
            }
        }

        gomod
    }

    /// Version of the required module providing `package`: the package path
    /// itself or its nearest ancestor that appears in a `require`.
    pub fn version_for_package(&self, package: &str) -> Option<&str> {
        let mut candidate = package.trim_end_matches('/');
        loop {
            if let Some(req) = self.requires.iter().find(|r| r.path == candidate) {
                return Some(&req.version);
            }
            candidate = candidate.rsplit_once('/')?.0;
        }
    }
}

fn parse_require(line: &str) -> Option<Require> {
    let mut parts = line.split_whitespace();
    let path = unquote(parts.next()?);
    let version = unquote(parts.next()?);
    Some(Require {
        path: path.to_string(),
        version: version.to_string(),
    })
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '`')
}

/// Nearest `go.mod` at or above `start`.
pub fn find_go_mod(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MODULE_MARKER))
        .find(|p| p.is_file())
}
