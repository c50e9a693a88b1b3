//! `gobin cache` command
//!
//! Manage the go-run build cache.

use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::cli::{CacheArgs, CacheCommands};
use gobin::builder::build_cache::sweep;
use gobin::util::fs::{dir_size, format_size, remove_dir_all_if_exists};
use gobin::util::GlobalContext;

pub fn execute(args: CacheArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let root = ctx.build_cache_root();

    match args.command {
        CacheCommands::Path => {
            println!("{}", root.display());
        }
        CacheCommands::Sweep => {
            let stats = sweep(&root, ctx.config().eviction_age(), SystemTime::now());
            eprintln!(
                "     Removed {} entries, {} freed ({} kept)",
                stats.removed,
                format_size(stats.freed_bytes),
                stats.kept
            );
        }
        CacheCommands::Purge => {
            let size = dir_size(&root);
            remove_dir_all_if_exists(&root)
                .with_context(|| format!("failed to remove {}", root.display()))?;
            eprintln!("     Removed {} ({})", root.display(), format_size(size));
        }
    }

    Ok(())
}
