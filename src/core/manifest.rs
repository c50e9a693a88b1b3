//! Gobinfile parsing and lookup.
//!
//! One entry per line:
//!
//! ```text
//! # comment
//! golang.org/x/tools/cmd/stringer@v0.20.0
//! github.com/owner/repo/cmd/tool  tags=netgo,osusergo  requires=golang.org/x/tools/cmd/stringer
//! ```
//!
//! A missing `@version` (or `@latest`) requests the newest release. `#`
//! starts a comment unless escaped as `\#`. Unknown options are ignored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::error::{GobinError, Result};
use crate::core::lockfile::{LockFormat, LockMap};
use crate::core::package_ref::{base_name, PackageRef, VersionConstraint};

/// Manifest file names, in lookup order.
pub const MANIFEST_NAMES: [&str; 2] = ["Gobinfile", ".Gobinfile"];

/// Suffix appended to the manifest name to form the lock file name.
pub const LOCK_SUFFIX: &str = "-lock";

/// Suffix of the JSON lock layout.
pub const JSON_LOCK_SUFFIX: &str = "-lock.json";

/// A package requested by the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub package_path: String,
    pub constraint: VersionConstraint,
    /// Build tags, order preserved, duplicates dropped.
    pub build_tags: Vec<String>,
    /// References installed alongside this entry.
    pub requires: Vec<String>,
    /// 1-based line number in the manifest.
    pub line: usize,
}

impl ManifestEntry {
    pub fn new(package_path: impl Into<String>, constraint: VersionConstraint) -> Self {
        ManifestEntry {
            package_path: package_path.into(),
            constraint,
            build_tags: Vec::new(),
            requires: Vec::new(),
            line: 0,
        }
    }

    pub fn base_name(&self) -> &str {
        base_name(&self.package_path)
    }

    /// Tags as passed to `go install -tags`, or `None` when there are none.
    pub fn tags(&self) -> Option<String> {
        if self.build_tags.is_empty() {
            None
        } else {
            Some(self.build_tags.join(","))
        }
    }

    /// Build flags recorded in a JSON lock file, e.g. `-tags=netgo,osusergo`.
    pub fn build_opts(&self) -> Vec<String> {
        self.tags()
            .map(|tags| vec![format!("-tags={}", tags)])
            .unwrap_or_default()
    }
}

/// A parsed manifest together with its lock file.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    lock_path: PathBuf,
    entries: Vec<ManifestEntry>,
    lock: LockMap,
}

impl Manifest {
    /// Load the manifest and lock file that live in `config_dir`.
    ///
    /// A missing manifest yields an empty entry list.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = find_manifest_file(config_dir)
            .unwrap_or_else(|| config_dir.join(MANIFEST_NAMES[0]));
        let lock_path = lock_path_for(&path);

        let entries = if path.is_file() {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| GobinError::io(&path, e))?;
            parse_entries(&path, &contents)?
        } else {
            Vec::new()
        };

        let mut lock = LockMap::load(&lock_path)?;
        if lock.is_empty() && has_json_suffix(&lock_path) {
            lock = lock.with_format(LockFormat::Json);
        }

        tracing::debug!(
            "loaded {} entries from {} ({} locked)",
            entries.len(),
            path.display(),
            lock.len()
        );

        Ok(Manifest {
            path,
            lock_path,
            entries,
            lock,
        })
    }

    /// Build a manifest from already-parsed parts.
    pub fn from_parts(
        path: PathBuf,
        lock_path: PathBuf,
        entries: Vec<ManifestEntry>,
        lock: LockMap,
    ) -> Self {
        Manifest {
            path,
            lock_path,
            entries,
            lock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn lock(&self) -> &LockMap {
        &self.lock
    }

    pub fn lock_mut(&mut self) -> &mut LockMap {
        &mut self.lock
    }

    /// Find an entry by exact path, `path@version` (version ignored), or
    /// command base name.
    ///
    /// A base name shared by several entries is an error rather than a
    /// silent pick.
    pub fn lookup(&self, pattern: &str) -> Result<Option<&ManifestEntry>> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(None);
        }
        if let Some((path, _)) = pattern.split_once('@') {
            return Ok(self.find(path));
        }
        if pattern.contains('/') {
            return Ok(self.find(pattern));
        }

        let matches: Vec<&ManifestEntry> = self
            .entries
            .iter()
            .filter(|e| e.base_name() == pattern)
            .collect();
        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(GobinError::AmbiguousCommand {
                name: pattern.to_string(),
                candidates: many.iter().map(|e| e.package_path.clone()).collect(),
            }),
        }
    }

    fn find(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.package_path == path)
    }

    /// The version to use for an entry: the lock wins over the manifest.
    pub fn effective_version(&self, entry: &ManifestEntry) -> VersionConstraint {
        match self.lock.get(&entry.package_path) {
            Some(locked) => VersionConstraint::Pinned(locked.to_string()),
            None => entry.constraint.clone(),
        }
    }

    /// Write the lock file next to the manifest.
    pub fn save_lockfile(&self) -> Result<()> {
        self.save_lockfile_as(&self.lock_path)
    }

    /// Write one line per entry with a concrete version, sorted by path.
    pub fn save_lockfile_as(&self, path: &Path) -> Result<()> {
        let mut out = LockMap::new().with_format(self.lock.format());
        let mut entries: Vec<&ManifestEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.package_path.cmp(&b.package_path));
        for entry in entries {
            if let VersionConstraint::Pinned(version) = self.effective_version(entry) {
                out.insert_with_opts(entry.package_path.clone(), version, entry.build_opts());
            }
        }
        tracing::debug!("writing {} lock entries to {}", out.len(), path.display());
        out.save(path)
    }
}

/// First manifest file present in `dir`.
pub fn find_manifest_file(dir: &Path) -> Option<PathBuf> {
    MANIFEST_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Lock file belonging to a manifest. The JSON layout is used when it
/// already exists.
pub fn lock_path_for(manifest_path: &Path) -> PathBuf {
    let name = manifest_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| MANIFEST_NAMES[0].to_string());
    let json = manifest_path.with_file_name(format!("{}{}", name, JSON_LOCK_SUFFIX));
    if json.is_file() {
        json
    } else {
        manifest_path.with_file_name(format!("{}{}", name, LOCK_SUFFIX))
    }
}

fn has_json_suffix(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Parse manifest text. Lines that cannot name a package are rejected;
/// stray tokens and unknown options are skipped.
pub fn parse_entries(path: &Path, contents: &str) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (index, raw) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw);
        let mut tokens = line.split_whitespace();
        let Some(reference) = tokens.next() else {
            continue;
        };

        let reference = PackageRef::parse(reference);
        if reference.path.is_empty() {
            return Err(GobinError::ManifestParse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("missing package path in `{}`", line.trim()),
            });
        }
        if !seen.insert(reference.path.clone()) {
            return Err(GobinError::ManifestParse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("`{}` is listed more than once", reference.path),
            });
        }

        let mut entry = ManifestEntry::new(reference.path, reference.version);
        entry.line = line_no;

        for opt in tokens {
            let Some((key, value)) = opt.split_once('=') else {
                tracing::debug!("{}:{}: ignoring option `{}`", path.display(), line_no, opt);
                continue;
            };
            match key {
                "requires" => entry.requires.extend(split_list(value)),
                "tags" => {
                    for tag in split_list(value) {
                        if !entry.build_tags.contains(&tag) {
                            entry.build_tags.push(tag);
                        }
                    }
                }
                _ => tracing::debug!("{}:{}: unknown option `{}`", path.display(), line_no, key),
            }
        }

        entries.push(entry);
    }

    Ok(entries)
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Drop everything from the first unescaped `#`; `\#` becomes `#`.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}
