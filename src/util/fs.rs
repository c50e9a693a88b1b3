//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use walkdir::WalkDir;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Point `link` at `target` by creating a sibling temp link and renaming it
/// over `link`, so `link` never disappears in between.
pub fn replace_symlink(target: &Path, link: &Path) -> io::Result<()> {
    let name = link
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = link.with_file_name(format!(
        ".{}.{}-{:08x}.tmp",
        name,
        std::process::id(),
        rand::random::<u32>()
    ));

    symlink(target, &tmp)?;
    if let Err(e) = fs::rename(&tmp, link) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Rename `from` to `to`. If the rename fails but `to` already exists, a
/// concurrent writer published it first and `from` is discarded.
pub fn rename_or_adopt(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if to.exists() => {
            tracing::debug!(
                "rename to {} failed ({}), keeping existing file",
                to.display(),
                e
            );
            let _ = fs::remove_file(from);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Time since `path` was last modified. `None` if it cannot be determined
/// or the timestamp lies in the future.
pub fn age(path: &Path, now: SystemTime) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    now.duration_since(modified).ok()
}

/// Total size of the files below `path`.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Canonicalize a path, returning it unchanged if that fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[test]
    fn test_replace_symlink() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("foo@v1.0.0"), "one").unwrap();
        fs::write(tmp.path().join("foo@v2.0.0"), "two").unwrap();
        let link = tmp.path().join("foo");

        replace_symlink(Path::new("foo@v1.0.0"), &link).unwrap();
        assert_eq!(fs::read_to_string(&link).unwrap(), "one");

        replace_symlink(Path::new("foo@v2.0.0"), &link).unwrap();
        assert_eq!(fs::read_link(&link).unwrap(), Path::new("foo@v2.0.0"));

        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_rename_or_adopt_keeps_existing_directory_target() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("staged");
        let to = tmp.path().join("published");
        fs::write(&from, "new").unwrap();
        fs::create_dir(&to).unwrap();
        fs::write(to.join("inner"), "x").unwrap();

        // Renaming a file over a non-empty directory fails everywhere.
        rename_or_adopt(&from, &to).unwrap();
        assert!(to.is_dir());
        assert!(!from.exists());
    }

    #[test]
    fn test_remove_if_exists_tolerates_missing() {
        let tmp = TempDir::new().unwrap();
        remove_dir_all_if_exists(&tmp.path().join("nope")).unwrap();
    }

    #[test]
    fn test_dir_size_and_format() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("abc")).unwrap();
        fs::write(tmp.path().join("abc").join("main"), vec![0u8; 2048]).unwrap();

        assert_eq!(dir_size(tmp.path()), 2048);
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(12), "12 B");
    }
}
