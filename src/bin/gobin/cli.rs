//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// gobin - install and run pinned versions of Go programs
#[derive(Parser)]
#[command(name = "gobin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    /// Use ~/Gobinfile and the global install directory
    #[arg(short, long, global = true)]
    pub global: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command from the Gobinfile, installing it first if needed
    Run(RunArgs),

    /// Install the named packages (all of them when none are given)
    Install(InstallArgs),

    /// Install every package in the Gobinfile
    Apply,

    /// Re-resolve `latest` packages and rewrite the lock file
    Update(UpdateArgs),

    /// Show each package with its locked version
    List,

    /// Build Go files or a package once and run the cached binary
    GoRun(GoRunArgs),

    /// Manage the go-run build cache
    Cache(CacheArgs),
}

impl Commands {
    /// Whether the command works against a Gobinfile and may hand over to a
    /// pinned gobin.
    pub fn uses_manifest(&self) -> bool {
        matches!(
            self,
            Commands::Run(_) | Commands::Install(_) | Commands::Apply | Commands::Update(_)
        )
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Command name or package reference, then its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Command names, package paths or `path@version` references
    pub names: Vec<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Packages to update (default: all)
    pub names: Vec<String>,
}

#[derive(Args)]
pub struct GoRunArgs {
    /// `go build` flags followed by .go files, a directory or a package
    #[arg(required = true, allow_hyphen_values = true, value_name = "BUILD_ARGS")]
    pub build_args: Vec<String>,

    /// Arguments for the program, after `--`
    #[arg(last = true, value_name = "ARGS")]
    pub program_args: Vec<String>,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show the build cache directory
    Path,

    /// Evict entries older than the eviction age now
    Sweep,

    /// Delete the whole build cache
    Purge,
}
