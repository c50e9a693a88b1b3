//! Test fixtures for common test scenarios.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary project directory with a Gobinfile and optional extras.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    /// Empty project directory.
    pub fn new() -> Self {
        ProjectFixture {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Project with the given Gobinfile contents.
    pub fn with_manifest(contents: &str) -> Self {
        let fixture = ProjectFixture::new();
        fixture.write("Gobinfile", contents);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    pub fn read(&self, rel: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap_or_default()
    }

    /// Local install directory for this project.
    pub fn install_dir(&self) -> PathBuf {
        self.dir.path().join(".gobin")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        ProjectFixture::new()
    }
}

/// A trivial `main` package.
pub fn hello_go(message: &str) -> String {
    format!("package main\n\nimport \"fmt\"\n\nfunc main() {{ fmt.Println(\"{}\") }}\n", message)
}
