//! Cellar - declarative package builder and installer
//!
//! Entry point for the cellar command-line application.

use clap::Parser;

use cellar::cli::output::display_error;
use cellar::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        match cli.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run().await {
        display_error(&e);
        std::process::exit(e.exit_code());
    }
}
