//! Content-addressed cache for `go-run` builds.
//!
//! Layout:
//!
//! ```text
//! <root>/<key>/main             the built binary
//! <root>/<key>/build_info.json  inputs that produced it
//! ```
//!
//! A present `main` is reused as-is, except for `@latest` package builds,
//! which are rebuilt once the binary is older than the rebuild threshold.
//! Builds happen in a private staging directory and are renamed into place.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rand::Rng;
use walkdir::WalkDir;

use crate::builder::fingerprint::BuildInfo;
use crate::builder::toolchain::{InstallRequest, Toolchain};
use crate::core::error::{GobinError, Result};
use crate::core::package_ref::{base_name, LATEST};
use crate::util::config::Config;
use crate::util::fs::{age, dir_size, remove_dir_all_if_exists, rename_or_adopt};

/// File name of a cached binary.
pub fn artifact_file_name() -> String {
    format!("main{}", EXE_SUFFIX)
}

/// Settings for a [`BuildCache`].
#[derive(Debug, Clone)]
pub struct BuildCacheOptions {
    pub root: PathBuf,
    /// Sweep on one in this many invocations; 0 never sweeps.
    pub cleanup_cycle: u32,
    /// Entries whose binary is older than this are evicted.
    pub eviction_age: Duration,
    /// `@latest` binaries older than this are rebuilt.
    pub latest_rebuild_age: Duration,
}

impl BuildCacheOptions {
    /// Defaults: sweep 1 in 100, evict after 90 days, rebuild `@latest` after 30.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &Config::default())
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        BuildCacheOptions {
            root: root.into(),
            cleanup_cycle: config.cleanup_cycle(),
            eviction_age: config.eviction_age(),
            latest_rebuild_age: config.latest_rebuild_age(),
        }
    }
}

/// Outcome of an eviction sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub removed: usize,
    pub kept: usize,
    pub freed_bytes: u64,
}

/// The build cache rooted at one directory.
pub struct BuildCache<'a> {
    toolchain: &'a dyn Toolchain,
    opts: BuildCacheOptions,
}

impl<'a> BuildCache<'a> {
    pub fn new(toolchain: &'a dyn Toolchain, opts: BuildCacheOptions) -> Self {
        BuildCache { toolchain, opts }
    }

    pub fn root(&self) -> &Path {
        &self.opts.root
    }

    /// Directory of the entry for `info`.
    pub fn entry_dir(&self, info: &BuildInfo) -> PathBuf {
        self.opts.root.join(&info.hash)
    }

    /// Binary for a build of loose source files; `go build -o` runs only
    /// when the entry is missing. `build_args` is the full argument list,
    /// files included.
    pub fn ensure_files(&self, info: &BuildInfo, build_args: &[String]) -> Result<PathBuf> {
        let dir = self.entry_dir(info);
        let main = dir.join(artifact_file_name());
        if main.is_file() {
            tracing::debug!("build cache hit: {}", dir.display());
            return Ok(main);
        }

        let staging = self.staging_dir(&dir)?;
        let out = staging.path().join(artifact_file_name());
        self.toolchain.build(&out, build_args)?;
        self.publish(&out, &main, info)?;
        Ok(main)
    }

    /// Binary for a package reference, built with `go install`.
    ///
    /// `version` is the concrete version, or `latest`; in the latter case an
    /// entry older than the rebuild threshold is rebuilt in place.
    pub fn ensure_package(
        &self,
        info: &BuildInfo,
        package_path: &str,
        version: &str,
        build_args: &[String],
    ) -> Result<PathBuf> {
        let dir = self.entry_dir(info);
        let main = dir.join(artifact_file_name());

        let stale_latest = version == LATEST
            && age(&main, SystemTime::now()).is_some_and(|a| a > self.opts.latest_rebuild_age);
        if main.is_file() && !stale_latest {
            tracing::debug!("build cache hit: {}", dir.display());
            return Ok(main);
        }
        if stale_latest {
            tracing::info!("rebuilding {}@{}, cached binary is outdated", package_path, version);
        }

        let staging = self.staging_dir(&dir)?;
        let target = format!("{}@{}", package_path, version);
        self.toolchain.install(&InstallRequest {
            target: &target,
            out_dir: staging.path(),
            build_args,
        })?;

        let produced = staging
            .path()
            .join(format!("{}{}", base_name(package_path), EXE_SUFFIX));
        self.publish(&produced, &main, info)?;
        Ok(main)
    }

    fn staging_dir(&self, dir: &Path) -> Result<tempfile::TempDir> {
        std::fs::create_dir_all(dir).map_err(|e| GobinError::install_io(dir, e))?;
        tempfile::Builder::new()
            .prefix(".build-")
            .tempdir_in(dir)
            .map_err(|e| GobinError::install_io(dir, e))
    }

    fn publish(&self, built: &Path, main: &Path, info: &BuildInfo) -> Result<()> {
        if !built.is_file() {
            return Err(GobinError::install_io(
                built,
                std::io::Error::new(std::io::ErrorKind::NotFound, "toolchain produced no binary"),
            ));
        }
        rename_or_adopt(built, main).map_err(|e| GobinError::install_io(main, e))?;
        if let Some(dir) = main.parent() {
            info.write(dir)?;
        }
        Ok(())
    }

    /// Run the eviction sweep on a random one-in-`cleanup_cycle` subset of
    /// calls. Failures are logged, never returned.
    pub fn maybe_sweep(&self) -> Option<SweepStats> {
        let cycle = self.opts.cleanup_cycle;
        if cycle == 0 || !rand::thread_rng().gen_ratio(1, cycle) {
            return None;
        }
        Some(sweep(&self.opts.root, self.opts.eviction_age, SystemTime::now()))
    }
}

/// Delete every entry under `root` whose binary is older than `max_age`.
///
/// Entries without a binary (builds in progress) are left alone.
pub fn sweep(root: &Path, max_age: Duration, now: SystemTime) -> SweepStats {
    let mut stats = SweepStats::default();
    if !root.is_dir() {
        return stats;
    }

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let dir = entry.path();
        match age(&dir.join(artifact_file_name()), now) {
            Some(a) if a > max_age => {
                let size = dir_size(dir);
                match remove_dir_all_if_exists(dir) {
                    Ok(()) => {
                        tracing::debug!("evicted {}", dir.display());
                        stats.removed += 1;
                        stats.freed_bytes += size;
                    }
                    Err(e) => tracing::debug!("failed to evict {}: {}", dir.display(), e),
                }
            }
            _ => stats.kept += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::fingerprint::SourceFile;
    use crate::test_support::{hello_go, FakeToolchain, ProjectFixture, FAKE_GO_VERSION};
    use filetime::FileTime;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn backdate(path: &Path, days: u64) {
        let when = SystemTime::now() - DAY * days as u32;
        filetime::set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
    }

    fn package_info(reference: &str) -> BuildInfo {
        BuildInfo::new(FAKE_GO_VERSION, vec![], Some(reference.to_string()), vec![])
    }

    #[test]
    fn test_files_build_once() {
        let p = ProjectFixture::new();
        let src = p.write("main.go", &hello_go("hi"));
        let toolchain = FakeToolchain::new();
        let cache = BuildCache::new(&toolchain, BuildCacheOptions::new(p.root().join("cache")));

        let info = BuildInfo::new(
            FAKE_GO_VERSION,
            vec![],
            None,
            vec![SourceFile::from_path(&src).unwrap()],
        );
        let args = vec![src.display().to_string()];

        let first = cache.ensure_files(&info, &args).unwrap();
        let second = cache.ensure_files(&info, &args).unwrap();

        assert_eq!(first, second);
        assert_eq!(toolchain.count("build"), 1);
        assert!(cache.entry_dir(&info).join("build_info.json").is_file());
        assert_eq!(first.parent().unwrap().file_name().unwrap().to_str(), Some(info.hash.as_str()));
    }

    #[test]
    fn test_package_build_once() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();
        let cache = BuildCache::new(&toolchain, BuildCacheOptions::new(p.root()));
        let info = package_info("example.org/tools/cmd/foo@v1.0.0");

        let main = cache
            .ensure_package(&info, "example.org/tools/cmd/foo", "v1.0.0", &[])
            .unwrap();
        cache
            .ensure_package(&info, "example.org/tools/cmd/foo", "v1.0.0", &[])
            .unwrap();

        assert!(main.is_file());
        assert_eq!(toolchain.calls(), vec!["install example.org/tools/cmd/foo@v1.0.0"]);
    }

    #[test]
    fn test_stale_latest_is_rebuilt() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();
        let cache = BuildCache::new(&toolchain, BuildCacheOptions::new(p.root()));
        let info = package_info("example.org/tools/cmd/foo@latest");

        let main = cache
            .ensure_package(&info, "example.org/tools/cmd/foo", LATEST, &[])
            .unwrap();
        backdate(&main, 10);
        cache
            .ensure_package(&info, "example.org/tools/cmd/foo", LATEST, &[])
            .unwrap();
        assert_eq!(toolchain.count("install"), 1);

        backdate(&main, 31);
        cache
            .ensure_package(&info, "example.org/tools/cmd/foo", LATEST, &[])
            .unwrap();
        assert_eq!(toolchain.count("install"), 2);
        assert!(age(&main, SystemTime::now()).unwrap() < DAY);
    }

    #[test]
    fn test_pinned_is_never_rebuilt_for_age() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();
        let cache = BuildCache::new(&toolchain, BuildCacheOptions::new(p.root()));
        let info = package_info("example.org/tools/cmd/foo@v1.0.0");

        let main = cache
            .ensure_package(&info, "example.org/tools/cmd/foo", "v1.0.0", &[])
            .unwrap();
        backdate(&main, 60);
        cache
            .ensure_package(&info, "example.org/tools/cmd/foo", "v1.0.0", &[])
            .unwrap();
        assert_eq!(toolchain.count("install"), 1);
    }

    #[test]
    fn test_build_failure_leaves_no_entry() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new()
            .with_install_failure("example.org/tools/cmd/foo@v1.0.0", "compile error");
        let cache = BuildCache::new(&toolchain, BuildCacheOptions::new(p.root()));
        let info = package_info("example.org/tools/cmd/foo@v1.0.0");

        let err = cache
            .ensure_package(&info, "example.org/tools/cmd/foo", "v1.0.0", &[])
            .unwrap_err();
        assert!(matches!(err, GobinError::BuildFailed { .. }));
        assert!(!cache.entry_dir(&info).join(artifact_file_name()).exists());
    }

    #[test]
    fn test_sweep_respects_age() {
        let p = ProjectFixture::new();
        let fresh = p.write(format!("fresh/{}", artifact_file_name()), "bin");
        let old = p.write(format!("old/{}", artifact_file_name()), "bin");
        p.write("building/.build-x/partial", "");
        backdate(&fresh, 89);
        backdate(&old, 91);

        let stats = sweep(p.root(), 90 * DAY, SystemTime::now());

        assert_eq!(stats.removed, 1);
        assert_eq!(stats.kept, 2);
        assert!(fresh.exists());
        assert!(!p.root().join("old").exists());
        assert!(p.root().join("building").exists());
    }

    #[test]
    fn test_sweep_disabled() {
        let p = ProjectFixture::new();
        let toolchain = FakeToolchain::new();
        let mut opts = BuildCacheOptions::new(p.root());
        opts.cleanup_cycle = 0;
        assert!(BuildCache::new(&toolchain, opts).maybe_sweep().is_none());

        let mut opts = BuildCacheOptions::new(p.root());
        opts.cleanup_cycle = 1;
        assert!(BuildCache::new(&toolchain, opts).maybe_sweep().is_some());
    }
}
