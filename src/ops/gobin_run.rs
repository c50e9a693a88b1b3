//! Implementation of `gobin run`.

use anyhow::{Context, Result};

use crate::builder::toolchain::Toolchain;
use crate::core::error::GobinError;
use crate::core::manifest::{Manifest, ManifestEntry};
use crate::core::package_ref::{is_adhoc_reference, PackageRef};
use crate::ops::gobin_install::{install_adhoc, install_entry, save_if_resolved, Installed};
use crate::ops::project::Project;
use crate::util::process::{exit_code, prepend_path, ProcessBuilder};

/// What `gobin run` is asked to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    Entry(ManifestEntry),
    AdHoc(PackageRef),
}

/// A parsed `gobin run` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub target: RunTarget,
    /// Build tags for an ad-hoc reference, taken from `-tags` before it.
    pub tags: Option<String>,
    pub program_args: Vec<String>,
}

impl RunOptions {
    /// Split `args` into the target and its arguments.
    ///
    /// The first argument names a manifest entry. Failing that, the first
    /// ad-hoc `path@version` reference is the target: flags before it are
    /// build options, everything after it goes to the program.
    pub fn parse(manifest: &Manifest, args: &[String]) -> Result<Self> {
        let Some((first, rest)) = args.split_first() else {
            anyhow::bail!("no command given");
        };

        if let Some(entry) = manifest.lookup(first)? {
            return Ok(RunOptions {
                target: RunTarget::Entry(entry.clone()),
                tags: None,
                program_args: rest.to_vec(),
            });
        }

        let Some(index) = args.iter().position(|a| is_adhoc_reference(a)) else {
            return Err(GobinError::UnknownCommand {
                name: first.clone(),
            }
            .into());
        };

        Ok(RunOptions {
            target: RunTarget::AdHoc(PackageRef::parse(&args[index])),
            tags: tags_from_flags(&args[..index]),
            program_args: args[index + 1..].to_vec(),
        })
    }
}

/// The value of `-tags x` / `-tags=x` among build flags. Other flags are
/// not supported for installed binaries and are dropped with a warning.
fn tags_from_flags(flags: &[String]) -> Option<String> {
    let mut tags = None;
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        let name = flag.trim_start_matches('-');
        if let Some(value) = name.strip_prefix("tags=") {
            tags = Some(value.to_string());
        } else if name == "tags" {
            tags = iter.next().cloned();
        } else {
            tracing::warn!("ignoring build flag `{}`", flag);
        }
    }
    tags.filter(|t| !t.is_empty())
}

/// Install the target if needed.
pub fn prepare(toolchain: &dyn Toolchain, project: &mut Project, opts: &RunOptions) -> Result<Installed> {
    let installed = match &opts.target {
        RunTarget::Entry(entry) => install_entry(toolchain, project, entry)?,
        RunTarget::AdHoc(reference) => {
            install_adhoc(toolchain, project, reference, opts.tags.as_deref())?
        }
    };
    if matches!(opts.target, RunTarget::Entry(_)) {
        save_if_resolved(project, std::slice::from_ref(&installed))?;
    }
    Ok(installed)
}

/// Install the target if needed and run it. Returns the program's exit code.
pub fn run(toolchain: &dyn Toolchain, project: &mut Project, opts: &RunOptions) -> Result<i32> {
    let installed = prepare(toolchain, project, opts)?;

    let path = prepend_path(project.install_dir()).context("failed to build PATH")?;
    let status = ProcessBuilder::new(installed.path())
        .args(&opts.program_args)
        .env("PATH", path)
        .status()
        .with_context(|| format!("failed to run {}", installed.path().display()))?;

    Ok(exit_code(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::project::test_project;
    use crate::test_support::{FakeToolchain, ProjectFixture};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_manifest_entry() {
        let p = ProjectFixture::with_manifest("example.org/tools/cmd/foo@v1.2.3\n");
        let project = test_project(&p);

        let opts = RunOptions::parse(project.manifest(), &args(&["foo", "--help", "x"])).unwrap();

        match &opts.target {
            RunTarget::Entry(entry) => assert_eq!(entry.package_path, "example.org/tools/cmd/foo"),
            other => panic!("unexpected target: {other:?}"),
        }
        assert_eq!(opts.program_args, args(&["--help", "x"]));
    }

    #[test]
    fn test_parse_adhoc_reference() {
        let p = ProjectFixture::with_manifest("");
        let project = test_project(&p);

        let opts = RunOptions::parse(
            project.manifest(),
            &args(&["-tags", "netgo", "example.org/tools/cmd/qux@v0.1.0", "-v"]),
        )
        .unwrap();

        assert_eq!(
            opts.target,
            RunTarget::AdHoc(PackageRef::parse("example.org/tools/cmd/qux@v0.1.0"))
        );
        assert_eq!(opts.tags.as_deref(), Some("netgo"));
        assert_eq!(opts.program_args, args(&["-v"]));
    }

    #[test]
    fn test_parse_unknown() {
        let p = ProjectFixture::with_manifest("example.org/tools/cmd/foo@v1.2.3\n");
        let project = test_project(&p);

        let err = RunOptions::parse(project.manifest(), &args(&["bar"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GobinError>(),
            Some(GobinError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_tags_from_flags() {
        assert_eq!(tags_from_flags(&args(&["-tags=a,b"])).as_deref(), Some("a,b"));
        assert_eq!(tags_from_flags(&args(&["--tags", "x", "-race"])).as_deref(), Some("x"));
        assert_eq!(tags_from_flags(&args(&["-race"])), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_mirrors_exit_code() {
        let p = ProjectFixture::with_manifest("example.org/tools/cmd/foo\n");
        let toolchain = FakeToolchain::new().with_latest("example.org/tools/cmd/foo", "v1.0.0");
        let mut project = test_project(&p);

        let opts = RunOptions::parse(project.manifest(), &args(&["foo"])).unwrap();
        let installed = prepare(&toolchain, &mut project, &opts).unwrap();
        std::fs::write(installed.path(), "#!/bin/sh\nexit 7\n").unwrap();

        assert_eq!(run(&toolchain, &mut project, &opts).unwrap(), 7);
        assert_eq!(toolchain.count("install"), 1);
        assert!(p.read("Gobinfile-lock").contains("foo@v1.0.0"));
    }
}
