//! Error taxonomy for resolution and installation.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Result alias for component-level operations.
pub type Result<T, E = GobinError> = std::result::Result<T, E>;

/// Typed failures raised by the locator, stores, resolver and caches.
#[derive(Debug, Error)]
pub enum GobinError {
    #[error("no Gobinfile, lock file or go.mod found above `{}`", start.display())]
    ConfigNotFound { start: PathBuf },

    #[error("{}:{line}: {message}", path.display())]
    ManifestParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("no acceptable version found for `{package}`")]
    VersionResolutionFailed {
        package: String,
        candidates: Vec<String>,
    },

    #[error("build of `{target}` failed{}", code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    BuildFailed {
        target: String,
        code: Option<i32>,
        output: String,
    },

    #[error("failed to install into `{}`: {source}", path.display())]
    InstallIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no manifest entry or package reference matches `{name}`")]
    UnknownCommand { name: String },

    #[error("`{name}` matches several manifest entries")]
    AmbiguousCommand {
        name: String,
        candidates: Vec<String>,
    },

    #[error("go toolchain unavailable: {message}")]
    ToolchainUnavailable { message: String },

    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GobinError {
    pub(crate) fn install_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GobinError::InstallIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GobinError::Io {
            path: path.into(),
            source,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GobinError::ConfigNotFound { start } => {
                Diagnostic::error(format!("no Gobinfile found for `{}`", start.display()))
                    .with_context("searched every parent directory for Gobinfile, Gobinfile-lock and go.mod")
                    .with_suggestion(suggestions::NO_MANIFEST)
                    .with_suggestion(suggestions::USE_GLOBAL)
            }

            GobinError::ManifestParse { path, line, message } => {
                Diagnostic::error(format!("malformed manifest line {}", line))
                    .with_location(path.clone())
                    .with_context(message.clone())
            }

            GobinError::VersionResolutionFailed { package, candidates } => {
                let mut diag =
                    Diagnostic::error(format!("could not resolve a version for `{}`", package));
                if !candidates.is_empty() {
                    diag = diag.with_context(format!("tried modules: {}", candidates.join(", ")));
                }
                diag.with_suggestion(suggestions::PIN_VERSION)
                    .with_suggestion(suggestions::CHECK_NETWORK)
            }

            GobinError::BuildFailed { target, output, .. } => {
                let mut diag = Diagnostic::error(format!("`go` failed to build `{}`", target));
                for line in output.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.to_string());
                }
                diag
            }

            GobinError::InstallIo { path, source } => {
                Diagnostic::error(format!("could not publish `{}`", path.display()))
                    .with_context(source.to_string())
            }

            GobinError::UnknownCommand { name } => {
                Diagnostic::error(format!("unknown command `{}`", name))
                    .with_suggestion(suggestions::LIST_COMMANDS)
                    .with_suggestion(suggestions::ADHOC_REFERENCE)
            }

            GobinError::AmbiguousCommand { name, candidates } => {
                let mut diag = Diagnostic::error(format!("`{}` is ambiguous", name));
                for candidate in candidates {
                    diag = diag.with_context(format!("candidate: {}", candidate));
                }
                diag.with_suggestion("Use the full package path instead of the command name")
            }

            GobinError::ToolchainUnavailable { message } => {
                Diagnostic::error("the go command is not available")
                    .with_context(message.clone())
                    .with_suggestion(suggestions::INSTALL_GO)
            }

            GobinError::Io { path, source } => {
                Diagnostic::error(format!("I/O error on `{}`", path.display()))
                    .with_context(source.to_string())
            }
        }
    }
}
