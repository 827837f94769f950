//! Fetch command implementation
//!
//! Implements `cellar fetch`: download and verify every source archive and
//! patch in a package's plan without building anything. Cached files that
//! still match their digest are skipped unless `--force` is given.

use std::path::Path;

use crate::cli::output::{create_spinner, status};
use crate::config::defaults;
use crate::core::fetch::prefetch_plan;
use crate::core::resolver::resolve;
use crate::error::CellarError;
use crate::infra::download::Fetcher;

/// Execute the fetch command
pub async fn execute(
    target: &str,
    pool_dir: &Path,
    parallel: usize,
    force: bool,
    with_optional: bool,
    platform: Option<&str>,
) -> Result<(), CellarError> {
    let platform = super::resolve_platform(platform)?;
    let pool = super::load_pool(pool_dir, platform)?;
    let plan = resolve(&pool, target, with_optional)?;

    let cache_dir = defaults::default_cache_dir();
    let fetcher = Fetcher::new();
    let parallel = if parallel == 0 {
        defaults::DEFAULT_PARALLEL_FETCHES
    } else {
        parallel
    };

    let spinner = create_spinner(&format!("Fetching sources for {} package(s)", plan.len()));
    let mut summary = prefetch_plan(&fetcher, &cache_dir, &plan, parallel, force).await;
    spinner.finish_and_clear();

    if summary.downloaded.is_empty() && summary.failed.is_empty() {
        println!("{} Nothing to fetch", status::SUCCESS);
    } else {
        if !summary.downloaded.is_empty() {
            println!(
                "{} Downloaded {} package(s):",
                status::SUCCESS,
                summary.downloaded.len()
            );
            for name in &summary.downloaded {
                println!("    {name}");
            }
        }

        if !summary.skipped.is_empty() {
            println!(
                "  Skipped {} package(s) (already cached)",
                summary.skipped.len()
            );
        }

        if !summary.failed.is_empty() {
            println!(
                "{} Failed to fetch {} package(s):",
                status::ERROR,
                summary.failed.len()
            );
            for (name, error) in &summary.failed {
                println!("    {name}: {error}");
            }
        }
    }

    let result = match summary.failed.drain(..).next() {
        Some((_, error)) => Err(error.into()),
        None => Ok(()),
    };
    result
}
