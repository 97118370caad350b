//! CLI argument definitions using clap
//!
//! Commands:
//! - lessonpack create --lesson-id <n> --file <material.json>
//! - lessonpack update --lesson-id <n> --id <m> --file <patch.json>
//! - lessonpack show --lesson-id <n>
//! - lessonpack export --lesson-id <n> --graphic-types <types.json>
//! - lessonpack sign-url --bucket <b> --path <p> --method <GET|PUT>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// lessonpack - version and package recorded lesson material
#[derive(Parser, Debug)]
#[command(name = "lessonpack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding documents.json and the blobs/ tree
    #[arg(long, global = true, default_value = "./lessonpack-data")]
    pub data_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a new revision of a lesson's material
    Create {
        #[arg(long)]
        lesson_id: i64,

        /// JSON body of the material
        #[arg(long)]
        file: PathBuf,
    },

    /// Merge a partial document into an existing material
    Update {
        #[arg(long)]
        lesson_id: i64,

        #[arg(long)]
        id: i64,

        /// JSON patch; only the fields present are changed
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the current revision of a lesson
    Show {
        #[arg(long)]
        lesson_id: i64,
    },

    /// Package the current revision and publish the archive
    Export {
        #[arg(long)]
        lesson_id: i64,

        /// JSON object mapping graphic id to file extension
        #[arg(long)]
        graphic_types: PathBuf,
    },

    /// Issue a signed URL for a blob
    SignUrl {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        path: String,

        #[arg(long, default_value = "GET")]
        method: String,

        #[arg(long, default_value = "")]
        content_type: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
