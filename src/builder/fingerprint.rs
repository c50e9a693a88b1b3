//! Build cache keys.
//!
//! A key covers everything that determines the built binary: the toolchain
//! version, the build flags, and either the content of every source file or
//! the package reference being built. File names and command-line order do
//! not contribute, so the same sources listed differently share one entry.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{GobinError, Result};
use crate::core::gomod::find_go_mod;
use crate::core::lockfile::write_atomic;
use crate::util::hash::{sha256_file, Fingerprint};

/// Sidecar written next to each cached binary.
pub const BUILD_INFO_FILE: &str = "build_info.json";

/// `go build` flags that never take a separate value.
const BOOL_FLAGS: &[&str] = &[
    "-a", "-asan", "-cover", "-linkshared", "-modcacherw", "-msan", "-n", "-race", "-trimpath",
    "-v", "-work", "-x",
];

/// A Go source file that is part of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub hash: String,
    #[serde(skip)]
    pub size: u64,
}

impl SourceFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| GobinError::io(path, e))?;
        if meta.is_dir() {
            return Err(GobinError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            ));
        }
        Ok(SourceFile {
            name: path.display().to_string(),
            hash: sha256_file(path).map_err(|e| GobinError::io(path, e))?,
            size: meta.len(),
        })
    }
}

/// The inputs that produced a cached binary, plus their key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub go_version: String,
    /// Flags as given on the command line, target excluded.
    pub build_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<SourceFile>,
    pub hash: String,
}

impl BuildInfo {
    /// Compute the key for a build. `files` may arrive in any order.
    pub fn new(
        go_version: &str,
        build_args: Vec<String>,
        package: Option<String>,
        mut files: Vec<SourceFile>,
    ) -> Self {
        files.sort_by(|a, b| a.size.cmp(&b.size).then_with(|| a.hash.cmp(&b.hash)));

        let mut fp = Fingerprint::new();
        fp.update_str(go_version);
        for unit in canonical_flags(&build_args) {
            fp.update_str(&unit);
        }
        fp.update_opt(package.as_deref());
        fp.update_strs(files.iter().map(|f| f.hash.as_str()));

        BuildInfo {
            go_version: go_version.to_string(),
            build_args,
            package,
            files,
            hash: fp.finish(),
        }
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| {
            GobinError::io(dir.join(BUILD_INFO_FILE), std::io::Error::other(e))
        })?;
        write_atomic(&dir.join(BUILD_INFO_FILE), &json)
    }

    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(BUILD_INFO_FILE);
        let contents = std::fs::read(&path).map_err(|e| GobinError::io(&path, e))?;
        serde_json::from_slice(&contents)
            .map_err(|e| GobinError::io(&path, std::io::Error::other(e)))
    }
}

/// Group each flag with its value and sort the groups.
///
/// `-tags netgo -race` and `-race -tags netgo` give the same units, while a
/// value is never separated from the flag it belongs to.
pub fn canonical_flags(args: &[String]) -> Vec<String> {
    let mut units = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let takes_value = arg.starts_with('-') && !arg.contains('=') && !is_bool_flag(arg);
        match takes_value.then(|| iter.next()).flatten() {
            Some(value) => units.push(format!("{} {}", arg, value)),
            None => units.push(arg.clone()),
        }
    }
    units.sort();
    units
}

fn is_bool_flag(arg: &str) -> bool {
    let name = format!("-{}", arg.trim_start_matches('-'));
    BOOL_FLAGS.contains(&name.as_str())
}

/// What the last build arguments refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTarget {
    /// Loose `.go` files, or every `.go` file of a directory outside any module.
    Files {
        files: Vec<SourceFile>,
        build_args: Vec<String>,
    },
    /// An import path, optionally `@version`.
    Package {
        reference: String,
        build_args: Vec<String>,
    },
    /// Nothing that can be keyed reliably (e.g. a relative package inside a module).
    Uncacheable,
}

/// Classify `args` (flags followed by the build target).
pub fn classify_target(args: &[String]) -> Result<BuildTarget> {
    let Some((last, flags)) = args.split_last() else {
        return Ok(BuildTarget::Uncacheable);
    };

    let last_path = Path::new(last);
    if last_path.is_dir() {
        return directory_target(last_path, flags);
    }

    if last.ends_with(".go") {
        let mut files = Vec::new();
        let mut rest = args;
        while let Some((name, before)) = rest.split_last() {
            if !name.ends_with(".go") {
                break;
            }
            files.push(SourceFile::from_path(Path::new(name))?);
            rest = before;
        }
        return Ok(BuildTarget::Files {
            files,
            build_args: rest.to_vec(),
        });
    }

    if last.starts_with('.') || last.starts_with(std::path::MAIN_SEPARATOR) || last.starts_with('-')
    {
        return Ok(BuildTarget::Uncacheable);
    }

    Ok(BuildTarget::Package {
        reference: last.clone(),
        build_args: flags.to_vec(),
    })
}

fn directory_target(dir: &Path, flags: &[String]) -> Result<BuildTarget> {
    // Inside a module the package may import siblings that are not hashed.
    let parent = dir.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    if find_go_mod(&std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())).is_some()
    {
        return Ok(BuildTarget::Uncacheable);
    }

    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(BuildTarget::Uncacheable);
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "go") && path.is_file() {
            files.push(SourceFile::from_path(&path)?);
        }
    }
    if files.is_empty() {
        return Ok(BuildTarget::Uncacheable);
    }

    Ok(BuildTarget::Files {
        files,
        build_args: flags.to_vec(),
    })
}
