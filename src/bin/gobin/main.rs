//! gobin CLI - pinned, build-once installer and runner for Go programs

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use gobin::ops::alias_dispatch;
use gobin::util::diagnostic::emit;
use gobin::util::EnvOverrides;
use gobin::GobinError;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            match e.downcast_ref::<GobinError>() {
                Some(err) => emit(&err.to_diagnostic(), std::io::stderr().is_terminal()),
                None => eprintln!("error: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args: Vec<OsString> = std::env::args_os().collect();

    // Invoked through a dispatcher alias: `foo args..` means `gobin run foo args..`.
    let args = match args.first().and_then(|argv0| alias_dispatch(Path::new(argv0))) {
        Some(name) => {
            let mut dispatched = vec![OsString::from("gobin"), OsString::from("run"), name.into()];
            dispatched.extend(args.into_iter().skip(1));
            dispatched
        }
        None => args,
    };
    let cli = Cli::parse_from(&args);

    // Set up logging
    let env = EnvOverrides::from_env();
    let filter = if cli.verbose || env.verbose {
        EnvFilter::new("gobin=debug")
    } else if cli.silent || env.silent {
        EnvFilter::new("gobin=error")
    } else {
        EnvFilter::new("gobin=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    if cli.command.uses_manifest() {
        if let Some(code) = commands::bootstrap::maybe_switch(cli.global, &args[1..])? {
            return Ok(code);
        }
    }

    // Execute command
    let global = cli.global;
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, global),
        Commands::Install(args) => commands::install::execute(args, global).map(|()| 0),
        Commands::Apply => commands::apply::execute(global).map(|()| 0),
        Commands::Update(args) => commands::update::execute(args, global).map(|()| 0),
        Commands::List => commands::list::execute(global).map(|()| 0),
        Commands::GoRun(args) => commands::go_run::execute(args),
        Commands::Cache(args) => commands::cache::execute(args).map(|()| 0),
    }
}
