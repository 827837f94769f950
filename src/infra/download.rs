//! HTTP fetch with digest verification
//!
//! Streams remote content to disk while hashing it, retries transient
//! network failures with bounded exponential backoff, and fails closed on
//! digest mismatch. A mismatch is treated as a potential integrity issue:
//! the partial file is deleted and the fetch is never retried.

use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::defaults;
use crate::error::DownloadError;

/// Result of a completed fetch
#[derive(Debug)]
pub struct FetchedFile {
    /// Path the content was written to
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// SHA-256 digest of the content, lowercase hex
    pub digest: String,
}

/// HTTP fetcher with retry support
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_retries: u32,
    base_delay_ms: u64,
}

impl Fetcher {
    /// Create a fetcher with default retry settings
    pub fn new() -> Self {
        Self::with_config(defaults::MAX_FETCH_RETRIES, defaults::RETRY_BASE_DELAY_MS)
    }

    /// Create a fetcher with custom retry settings
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(300))
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            max_retries,
            base_delay_ms,
        }
    }

    /// Max retry attempts
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetch `url` into `dest`, retrying transient network failures.
    ///
    /// On exhaustion the partial file is removed and the last error is
    /// reported inside [`DownloadError::MaxRetriesExceeded`].
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedFile, DownloadError> {
        let mut attempts = 0;
        let mut last_error: Option<DownloadError> = None;
        let mut delay_ms = self.base_delay_ms;

        while attempts < self.max_retries {
            attempts += 1;

            match self.fetch_once(url, dest).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) => {
                    tracing::debug!(url, attempt = attempts, error = %e, "fetch attempt failed");
                    last_error = Some(e);

                    if attempts < self.max_retries {
                        // Exponential backoff with cap at 30 seconds
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(30_000);
                    }
                }
            }
        }

        // Clean up partial download on failure
        let _ = tokio::fs::remove_file(dest).await;

        Err(DownloadError::MaxRetriesExceeded {
            url: url.to_string(),
            retries: self.max_retries,
            error: last_error.map_or_else(|| "unknown".to_string(), |e| e.to_string()),
        })
    }

    /// Single fetch attempt without retry
    async fn fetch_once(&self, url: &str, dest: &Path) -> Result<FetchedFile, DownloadError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| DownloadError::Network {
                    url: url.to_string(),
                    error: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(DownloadError::Network {
                url: url.to_string(),
                error: format!("HTTP {}", response.status()),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::Io {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }

        let mut file = File::create(dest).await.map_err(|e| DownloadError::Io {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::Network {
                url: url.to_string(),
                error: e.to_string(),
            })?;

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::Io {
                    path: dest.to_path_buf(),
                    error: e.to_string(),
                })?;

            hasher.update(&chunk);
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| DownloadError::Io {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(FetchedFile {
            path: dest.to_path_buf(),
            size: written,
            digest: hex::encode(hasher.finalize()),
        })
    }

    /// Fetch `url` into `dest` and require the content to hash to
    /// `expected_digest`.
    ///
    /// A digest mismatch deletes the file and fails immediately; it is
    /// never retried.
    pub async fn fetch_verified(
        &self,
        url: &str,
        dest: &Path,
        expected_digest: &str,
    ) -> Result<FetchedFile, DownloadError> {
        let fetched = self.fetch(url, dest).await?;

        if fetched.digest != expected_digest.to_lowercase() {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(DownloadError::DigestMismatch {
                url: url.to_string(),
                expected: expected_digest.to_lowercase(),
                actual: fetched.digest,
            });
        }

        Ok(fetched)
    }

}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Verify that a file on disk hashes to `expected` (case-insensitive hex)
pub fn verify_digest(path: &Path, expected: &str) -> Result<bool, DownloadError> {
    let content = std::fs::read(path).map_err(|e| DownloadError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    Ok(compute_digest(&content) == expected.to_lowercase())
}

/// Compute the SHA-256 digest of in-memory data, lowercase hex
pub fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
