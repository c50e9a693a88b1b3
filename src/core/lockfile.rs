//! Lock file I/O.
//!
//! The lock file pins every previously resolved package to a concrete
//! version. Two on-disk layouts are understood:
//!
//! - text, one `path@version` (or `path version`) per line
//! - JSON, `{"path": {"version": "v1.2.3", "build_opts": [...]}}`
//!
//! The layout found on load is kept when saving. A missing file is an empty
//! map, not an error.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{GobinError, Result};
use crate::core::package_ref::LATEST;

/// On-disk layout of a lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockFormat {
    #[default]
    Text,
    Json,
}

/// One pinned package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_opts: Vec<String>,
}

/// Package path to resolved version. Values are always concrete versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockMap {
    entries: BTreeMap<String, LockEntry>,
    format: LockFormat,
}

fn is_concrete(version: &str) -> bool {
    !version.is_empty() && version != LATEST
}

impl LockMap {
    pub fn new() -> Self {
        LockMap::default()
    }

    /// Load a lock file; a missing file yields an empty map.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(LockMap::default());
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| GobinError::io(path, e))?;
        LockMap::parse(&contents).map_err(|message| GobinError::ManifestParse {
            path: path.to_path_buf(),
            line: 1,
            message,
        })
    }

    /// Parse lock file contents, detecting the layout.
    pub fn parse(contents: &str) -> std::result::Result<Self, String> {
        if contents.trim_start().starts_with('{') {
            Self::parse_json(contents)
        } else {
            Ok(Self::parse_text(contents))
        }
    }

    fn parse_text(contents: &str) -> Self {
        let mut map = LockMap::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = line
                .split_once('@')
                .or_else(|| line.split_once(char::is_whitespace));
            match parsed {
                Some((path, version)) => {
                    if !map.insert(path.trim(), version.trim()) {
                        tracing::warn!("ignoring unresolved lock entry `{}`", line);
                    }
                }
                None => tracing::warn!("ignoring malformed lock entry `{}`", line),
            }
        }
        map
    }

    fn parse_json(contents: &str) -> std::result::Result<Self, String> {
        let raw: BTreeMap<String, LockEntry> =
            serde_json::from_str(contents).map_err(|e| format!("invalid JSON lock file: {}", e))?;
        let entries = raw
            .into_iter()
            .filter(|(_, entry)| is_concrete(&entry.version))
            .collect();
        Ok(LockMap {
            entries,
            format: LockFormat::Json,
        })
    }

    /// Use the given layout when saving.
    pub fn with_format(mut self, format: LockFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> LockFormat {
        self.format
    }

    /// Locked version of a package.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(|e| e.version.as_str())
    }

    pub fn entry(&self, path: &str) -> Option<&LockEntry> {
        self.entries.get(path)
    }

    /// Pin `path` to `version`. Returns false (and changes nothing) if the
    /// version is not concrete.
    pub fn insert(&mut self, path: impl Into<String>, version: impl Into<String>) -> bool {
        self.insert_with_opts(path, version, Vec::new())
    }

    pub fn insert_with_opts(
        &mut self,
        path: impl Into<String>,
        version: impl Into<String>,
        build_opts: Vec<String>,
    ) -> bool {
        let version = version.into();
        if !is_concrete(&version) {
            return false;
        }
        self.entries.insert(
            path.into(),
            LockEntry {
                version,
                build_opts,
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render in the map's layout, sorted by package path.
    pub fn render(&self) -> String {
        match self.format {
            LockFormat::Text => self
                .entries
                .iter()
                .map(|(path, entry)| format!("{}@{}\n", path, entry.version))
                .collect(),
            LockFormat::Json => {
                let mut out = serde_json::to_string_pretty(&self.entries)
                    .unwrap_or_else(|_| "{}".to_string());
                out.push('\n');
                out
            }
        }
    }

    /// Write the lock file through a sibling temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.render().as_bytes())
    }
}

/// Replace `path` with `contents` via a temp file in the same directory.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| GobinError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.flush())
        .map_err(|e| GobinError::io(path, e))?;
    tmp.persist(path).map_err(|e| GobinError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_at_and_space_forms() {
        let map = LockMap::parse(
            "example.org/tools/cmd/foo@v1.2.3\n\nexample.org/tools/cmd/bar v0.4.0\n",
        )
        .unwrap();
        assert_eq!(map.get("example.org/tools/cmd/foo"), Some("v1.2.3"));
        assert_eq!(map.get("example.org/tools/cmd/bar"), Some("v0.4.0"));
        assert_eq!(map.format(), LockFormat::Text);
    }

    #[test]
    fn test_latest_is_never_stored() {
        let mut map = LockMap::parse("example.org/a/b@latest\nexample.org/a/c@\n").unwrap();
        assert!(map.is_empty());
        assert!(!map.insert("example.org/a/b", "latest"));
        assert!(map.get("example.org/a/b").is_none());
    }

    #[test]
    fn test_parse_json() {
        let map = LockMap::parse(
            r#"{"example.org/a/cmd/x": {"version": "v2.0.0", "build_opts": ["-tags=netgo"]}}"#,
        )
        .unwrap();
        assert_eq!(map.format(), LockFormat::Json);
        assert_eq!(map.get("example.org/a/cmd/x"), Some("v2.0.0"));
        assert_eq!(
            map.entry("example.org/a/cmd/x").unwrap().build_opts,
            vec!["-tags=netgo"]
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let map = LockMap::load(&tmp.path().join("Gobinfile-lock")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_save_sorted_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Gobinfile-lock");

        let mut map = LockMap::new();
        map.insert("example.org/z/cmd/zz", "v1.0.0");
        map.insert("example.org/a/cmd/aa", "v0.1.0");
        map.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "example.org/a/cmd/aa@v0.1.0\nexample.org/z/cmd/zz@v1.0.0\n"
        );
    }

    #[test]
    fn test_json_layout_is_preserved() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Gobinfile-lock.json");
        std::fs::write(&path, r#"{"example.org/a/cmd/x": {"version": "v1.0.0"}}"#).unwrap();

        let mut map = LockMap::load(&path).unwrap();
        map.insert("example.org/a/cmd/y", "v3.1.0");
        map.save(&path).unwrap();

        let reloaded = LockMap::load(&path).unwrap();
        assert_eq!(reloaded.format(), LockFormat::Json);
        assert_eq!(reloaded.get("example.org/a/cmd/y"), Some("v3.1.0"));
    }
}
