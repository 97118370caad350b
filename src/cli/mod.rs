//! CLI module for lessonpack
//!
//! Provides command-line interface for:
//! - create / update: write lesson material revisions
//! - show: print the current revision
//! - export: publish the lesson archive
//! - sign-url: issue a signed blob URL

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, CommonArgs};
pub use commands::{
    create, export, load_config, open_service, run_command, show, sign_url, update, LocalService,
};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    run_command(Cli::parse_args()).await
}
