//! DupeStash - gather duplicate files out of the way, and put them back
//!
//! `gather` scans a directory tree, finds files whose bytes are identical to
//! an earlier file in the scan, and moves each such duplicate into a numbered
//! slot of an archive directory together with a manifest of original paths.
//! `restore` reads the manifest, moves every slot back and deletes the archive.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod scanner;

use anyhow::Context;
use bytesize::ByteSize;

use crate::actions::{gather_duplicates, restore};
use crate::cli::{Cli, Commands, GatherArgs, RestoreArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;

/// Execute the parsed command line.
///
/// Logging must already be initialized. The one-line result is printed on
/// stdout; errors are returned to the caller for reporting.
///
/// # Errors
///
/// Returns the failing operation's error with the affected directory as
/// context. [`error::ErrorCategory::of`] recovers its category.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Gather(args) => handle_gather(args, Config::load()),
        Commands::Restore(args) => handle_restore(args),
    }
}

fn handle_gather(args: GatherArgs, config: Config) -> anyhow::Result<ExitCode> {
    let config = config.with_paranoid_override(args.paranoid);
    config.validate()?;
    let finder = DuplicateFinder::new(config.finder_config());
    log::debug!("Finder configuration: {:?}", finder.config());

    let report = gather_duplicates(&args.root, &args.dir, &finder)
        .with_context(|| format!("failed to gather duplicates into '{}'", args.dir.display()))?;

    log::info!(
        "Reclaimable: {} in {} files ({} scanned)",
        ByteSize::b(report.stats.duplicate_bytes),
        report.stats.duplicates,
        report.stats.files_seen
    );
    println!(
        "Gathered {} duplicates into '{}'",
        report.manifest.len(),
        args.dir.display()
    );
    Ok(ExitCode::Success)
}

fn handle_restore(args: RestoreArgs) -> anyhow::Result<ExitCode> {
    let count = restore(&args.dir)
        .with_context(|| format!("failed to restore '{}'", args.dir.display()))?;

    println!("Extracted {} duplicates from '{}'", count, args.dir.display());
    Ok(ExitCode::Success)
}
