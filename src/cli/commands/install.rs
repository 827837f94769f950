//! Install command implementation
//!
//! Implements `cellar install`: resolve the target's plan, then fetch,
//! build, and publish every package in dependency order. Ctrl-C cancels
//! in-flight builds and leaves the prefix untouched by unfinished
//! packages.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::cli::output::{create_spinner, status};
use crate::config::defaults;
use crate::core::install::{run_plan, FailurePolicy, InstallOptions};
use crate::core::resolver::resolve;
use crate::error::CellarError;

/// Install flags collected from the command line
#[derive(Debug)]
pub struct InstallArgs {
    /// Install prefix override
    pub prefix: Option<PathBuf>,
    /// Concurrent build limit override
    pub jobs: Option<usize>,
    /// Follow optional dependency edges
    pub with_optional: bool,
    /// Keep building unrelated packages after a failure
    pub keep_going: bool,
    /// Re-download sources even when cached copies verify
    pub force: bool,
}

/// Execute the install command
pub async fn execute(
    target: &str,
    pool_dir: &Path,
    args: InstallArgs,
    platform: Option<&str>,
) -> Result<(), CellarError> {
    let platform = super::resolve_platform(platform)?;
    let pool = super::load_pool(pool_dir, platform)?;
    let plan = resolve(&pool, target, args.with_optional)?;

    println!(
        "Installing '{target}' ({} package(s) in plan)",
        plan.len()
    );

    let options = InstallOptions {
        prefix: args.prefix.unwrap_or_else(defaults::default_prefix),
        cache_dir: defaults::default_cache_dir(),
        jobs: args.jobs.unwrap_or_else(defaults::default_jobs),
        force_fetch: args.force,
        policy: if args.keep_going {
            FailurePolicy::BestEffort
        } else {
            FailurePolicy::FailFast
        },
        platform,
    };

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            ctrl_c_cancel.cancel();
        }
    });

    let spinner = create_spinner(&format!("Building {} package(s)", plan.len()));
    let mut report = run_plan(&plan, &options, &cancel).await;
    spinner.finish_and_clear();

    for name in &report.already_installed {
        println!("  {name} (already installed)");
    }
    for name in &report.installed {
        println!("{} installed {name}", status::SUCCESS);
    }
    for (name, reason) in &report.failed {
        println!("{} {name}: {reason}", status::ERROR);
    }
    for (name, reason) in &report.skipped {
        println!("  skipped {name}: {reason}");
    }

    for (name, text) in &report.caveats {
        println!("\n{} Caveats for {name}:", status::INFO);
        for line in text.lines() {
            println!("    {line}");
        }
    }

    match report.first_error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
