//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use clap::Parser;

use commands::Commands;

use crate::error::CellarError;

/// Cellar - declarative package builder and installer
///
/// Builds packages from TOML descriptors: resolve dependencies, fetch and
/// verify sources, run the build steps, and publish atomically into a
/// prefix.
#[derive(Parser, Debug)]
#[command(name = "cellar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<(), CellarError> {
        if let Some(cmd) = self.command {
            cmd.run().await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()
                .map_err(|e| CellarError::Generic(e.to_string()))?;
            Ok(())
        }
    }
}
