// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the global flags, subcommands, and shared batch flags.

use clap::{Args, Parser, Subcommand};
use rokka::batch::{BatchOptions, DEFAULT_CONCURRENCY};
use rokka::output::OutputMode;
use rokka::types::Organization;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rokka")]
#[command(about = "Command line client for the rokka image service")]
#[command(version)]
pub struct Cli {
    /// Log HTTP requests and retries to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: ~/.rokka/config.yml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// API key, overrides ROKKA_API_KEY and the configuration file
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// API address, overrides the configuration file
    #[arg(long, global = true, value_name = "URL")]
    pub api_address: Option<String>,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store the API key given with --api-key (or ROKKA_API_KEY) in the configuration file
    Login {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Batch operations on source images
    #[command(name = "sourceimages")]
    SourceImages {
        #[command(subcommand)]
        command: SourceImagesCommand,
    },
}

#[derive(Subcommand)]
pub enum SourceImagesCommand {
    /// List the source images of an organization
    #[command(visible_alias = "l")]
    List {
        organization: Organization,

        /// Maximum number of images to return
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor of the page to start from, as printed by a previous list
        #[arg(long)]
        offset: Option<String>,
    },

    /// Show details of a source image
    #[command(visible_alias = "g")]
    Get {
        organization: Organization,
        hash: String,
    },

    /// Delete a single source image
    #[command(visible_alias = "del")]
    Delete {
        organization: Organization,
        hash: String,
    },

    /// Copy a single source image to another organization
    #[command(visible_alias = "cp")]
    Copy {
        source: Organization,
        hash: String,
        destination: Organization,
    },

    /// Copy all source images from one organization to another
    #[command(name = "copy-all", visible_alias = "cpa")]
    CopyAll {
        source: Organization,
        destination: Organization,
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Delete all source images of an organization
    #[command(name = "delete-all", visible_alias = "del-all")]
    DeleteAll {
        organization: Organization,
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Upload all images from a directory
    #[command(name = "massupload")]
    MassUpload {
        organization: Organization,
        path: PathBuf,

        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,

        /// File extensions to upload
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_value = "gif,jpg,png",
            value_name = "EXT"
        )]
        extensions: Vec<String>,

        #[command(flatten)]
        batch: BatchArgs,
    },
}

/// Flags shared by every batch command.
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: NonZeroUsize,

    /// Simulate the operation without changing anything on rokka
    #[arg(long)]
    pub dry_run: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl BatchArgs {
    pub fn options(&self) -> BatchOptions {
        BatchOptions::new(self.concurrency)
            .dry_run(self.dry_run)
            .force(self.force)
            .no_progress(self.no_progress)
    }
}
