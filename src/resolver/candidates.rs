//! Module-path candidates for a package path.
//!
//! A package path names a directory inside some module, but which prefix is
//! the module is only known to the module proxy. Candidates are tried from
//! the full path down to the shortest plausible module path (three segments,
//! `host/owner/repo`), so a major-version suffix such as `.../v2` is queried
//! before the bare repository.

/// Smallest number of path segments a module path is assumed to have.
pub const MIN_MODULE_SEGMENTS: usize = 3;

const INCOMPATIBLE: &str = "incompatible";

/// Module paths to query for `package_path`, longest first.
pub fn module_candidates(package_path: &str) -> Vec<String> {
    let segments: Vec<&str> = package_path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return Vec::new();
    }

    let shortest = MIN_MODULE_SEGMENTS.min(segments.len());
    (shortest..=segments.len())
        .rev()
        .map(|n| segments[..n].join("/"))
        .collect()
}

/// Whether `version` is a `+incompatible` pseudo-release: a v2+ tag on a
/// module that never adopted a `/vN` path.
pub fn is_incompatible(version: &str) -> bool {
    match semver::Version::parse(version.trim_start_matches('v')) {
        Ok(parsed) => parsed.build.as_str() == INCOMPATIBLE,
        Err(_) => version.ends_with("+incompatible"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_longest_first() {
        assert_eq!(
            module_candidates("example.org/owner/repo/v2/cmd/tool"),
            vec![
                "example.org/owner/repo/v2/cmd/tool",
                "example.org/owner/repo/v2/cmd",
                "example.org/owner/repo/v2",
                "example.org/owner/repo",
            ]
        );
    }

    #[test]
    fn test_major_version_before_bare_module() {
        let candidates = module_candidates("example.org/owner/repo/v3");
        let v3 = candidates.iter().position(|c| c.ends_with("/v3")).unwrap();
        let bare = candidates
            .iter()
            .position(|c| c == "example.org/owner/repo")
            .unwrap();
        assert!(v3 < bare);
    }

    #[test]
    fn test_short_paths() {
        assert_eq!(module_candidates("example.org/tool"), vec!["example.org/tool"]);
        assert_eq!(module_candidates("a/b/c"), vec!["a/b/c"]);
        assert!(module_candidates("").is_empty());
    }

    #[test]
    fn test_incompatible() {
        assert!(is_incompatible("v2.0.0+incompatible"));
        assert!(is_incompatible("v4.5.1+incompatible"));
        assert!(!is_incompatible("v1.2.3"));
        assert!(!is_incompatible("v0.0.0-20240101000000-abcdef123456"));
        assert!(!is_incompatible("v2.0.0+build.5"));
    }
}
