//! Command-line interface definitions for dupestash.
//!
//! Two verbs share global verbosity options:
//!
//! ```bash
//! # Move every duplicate under the current directory into ../dupes
//! dupestash gather ../dupes
//!
//! # Scan another tree and confirm matches byte by byte
//! dupestash gather /tmp/dupes --root ~/Photos --paranoid
//!
//! # Put everything back and remove the archive
//! dupestash restore ../dupes
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Gather byte-identical duplicate files into an archive directory, and
/// put them back.
#[derive(Debug, Parser)]
#[command(name = "dupestash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move duplicate files into an archive directory
    Gather(GatherArgs),
    /// Move archived duplicates back and delete the archive
    #[command(alias = "delete")]
    Restore(RestoreArgs),
}

/// Arguments for the gather subcommand.
#[derive(Debug, Args)]
pub struct GatherArgs {
    /// Archive directory to create (must not exist, or be empty)
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Directory tree to scan for duplicates
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub root: PathBuf,

    /// Confirm matches with a byte-by-byte comparison instead of a full hash
    #[arg(long)]
    pub paranoid: bool,
}

/// Arguments for the restore subcommand.
#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Archive directory produced by `gather`
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}
