//! Source and patch fetching
//!
//! Business logic for getting a descriptor's source archive and patches
//! into the local cache, verified against their digests. Cached files are
//! content-addressed: a file whose digest already matches is never fetched
//! again, so fetching is idempotent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::core::descriptor::Descriptor;
use crate::core::resolver::ResolutionPlan;
use crate::error::DownloadError;
use crate::infra::download::{verify_digest, Fetcher};

/// Local, digest-verified copies of a descriptor's remote inputs
#[derive(Debug, Clone)]
pub struct FetchedSources {
    /// Source archive in the cache
    pub archive: PathBuf,
    /// Patch files in the cache, in descriptor order
    pub patches: Vec<PathBuf>,
}

/// Outcome of fetching one descriptor's inputs
#[derive(Debug)]
pub struct FetchOutcome {
    /// The cached files
    pub sources: FetchedSources,
    /// Whether anything was actually downloaded (false = full cache hit)
    pub downloaded: bool,
}

/// Result of prefetching a whole plan
#[derive(Debug, Default)]
pub struct FetchSummary {
    /// Packages with at least one new download
    pub downloaded: Vec<String>,
    /// Packages fully served from the cache
    pub skipped: Vec<String>,
    /// Failed packages with their errors
    pub failed: Vec<(String, DownloadError)>,
}

impl FetchSummary {
    /// Whether every package fetched cleanly
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cache file name for a remote artifact.
///
/// The digest prefix keeps differently-versioned files with the same
/// basename apart and makes the cache content-addressed.
fn cache_file_name(url: &str, digest: &str) -> String {
    let base = url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("artifact");
    let base = base.split('?').next().unwrap_or(base);
    format!("{}-{base}", &digest[..16.min(digest.len())])
}

/// Fetch one remote file into the cache unless a valid copy is present.
async fn fetch_into_cache(
    fetcher: &Fetcher,
    cache_dir: &Path,
    url: &str,
    digest: &str,
    force: bool,
) -> Result<(PathBuf, bool), DownloadError> {
    let dest = cache_dir.join(cache_file_name(url, digest));

    if !force && dest.exists() && verify_digest(&dest, digest).unwrap_or(false) {
        tracing::debug!(url, path = %dest.display(), "cache hit");
        return Ok((dest, false));
    }

    fetcher.fetch_verified(url, &dest, digest).await?;
    Ok((dest, true))
}

/// Fetch a descriptor's source archive and all of its patches.
pub async fn fetch_sources(
    fetcher: &Fetcher,
    cache_dir: &Path,
    descriptor: &Descriptor,
    force: bool,
) -> Result<FetchOutcome, DownloadError> {
    let (archive, mut downloaded) = fetch_into_cache(
        fetcher,
        cache_dir,
        &descriptor.source.url,
        &descriptor.source.sha256,
        force,
    )
    .await?;

    let mut patches = Vec::with_capacity(descriptor.patches.len());
    for patch in &descriptor.patches {
        let (path, was_downloaded) =
            fetch_into_cache(fetcher, cache_dir, &patch.url, &patch.sha256, force).await?;
        downloaded |= was_downloaded;
        patches.push(path);
    }

    Ok(FetchOutcome {
        sources: FetchedSources { archive, patches },
        downloaded,
    })
}

/// Prefetch every descriptor in a plan, at most `parallel` at a time.
pub async fn prefetch_plan(
    fetcher: &Fetcher,
    cache_dir: &Path,
    plan: &ResolutionPlan,
    parallel: usize,
    force: bool,
) -> FetchSummary {
    let semaphore = Arc::new(Semaphore::new(parallel.max(1)));

    let handles: Vec<_> = plan
        .iter()
        .map(|descriptor| {
            let sem = semaphore.clone();
            let fetcher = fetcher.clone();
            let cache_dir = cache_dir.to_path_buf();
            let descriptor = descriptor.clone();

            tokio::spawn(async move {
                let _permit = sem.acquire().await.expect("semaphore closed");
                let name = descriptor.name().to_string();
                let outcome = fetch_sources(&fetcher, &cache_dir, &descriptor, force).await;
                (name, outcome)
            })
        })
        .collect();

    let mut summary = FetchSummary::default();
    for handle in handles {
        match handle.await {
            Ok((name, Ok(outcome))) => {
                if outcome.downloaded {
                    summary.downloaded.push(name);
                } else {
                    summary.skipped.push(name);
                }
            }
            Ok((name, Err(e))) => summary.failed.push((name, e)),
            Err(e) => summary.failed.push((
                "<task>".to_string(),
                DownloadError::Io {
                    path: PathBuf::new(),
                    error: e.to_string(),
                },
            )),
        }
    }

    summary
}
