//! Error types for cellar
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Descriptor parsing and validation errors
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Descriptor is not valid TOML or has wrong field types
    #[error("Malformed descriptor '{origin}': {error}")]
    Malformed { origin: String, error: String },

    /// Required field is absent or empty
    #[error("Descriptor '{package}' is missing required field '{field}'")]
    MissingField { package: String, field: String },

    /// Digest is absent, empty, or not a SHA-256 hex string
    #[error("Descriptor '{package}' has a missing or invalid sha256 digest for '{artifact}'")]
    InvalidDigest { package: String, artifact: String },

    /// Descriptor declares no install steps
    #[error("Descriptor '{package}' declares no install steps")]
    NoSteps { package: String },

    /// Dependency qualifier is not a recognized kind
    #[error(
        "Dependency '{dependency}' of '{package}' has invalid kind '{kind}' \
         (expected build, runtime, or optional)"
    )]
    InvalidDependencyKind {
        package: String,
        dependency: String,
        kind: String,
    },

    /// Two descriptors in the pool share a package name
    #[error("Duplicate descriptor for package '{package}'")]
    Duplicate { package: String },

    /// Pool directory does not exist
    #[error("Descriptor pool directory not found: {path}")]
    PoolNotFound { path: PathBuf },

    /// IO error while reading descriptors
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Dependency resolution errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Referenced dependency is absent from the pool
    #[error("Unresolved dependency: '{dependency}' required by '{package}'")]
    MissingDependency { package: String, dependency: String },

    /// Requested target is absent from the pool
    #[error("Package '{name}' not found in the descriptor pool")]
    UnknownTarget { name: String },
}

/// Fetch and digest verification errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error (transient, retried)
    #[error("Network error downloading '{url}': {error}")]
    Network { url: String, error: String },

    /// Content digest does not match the descriptor (fatal, never retried)
    #[error("Digest mismatch for '{url}': expected {expected}, got {actual}")]
    DigestMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    /// Retries exhausted
    #[error("Download failed after {retries} attempts: {url} ({error})")]
    MaxRetriesExceeded {
        url: String,
        retries: u32,
        error: String,
    },

    /// IO error while writing downloaded content
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Build execution errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// A step exited non-zero; remaining steps for the package are aborted
    #[error("Build step {index} ('{command}') of '{package}' failed: {status}")]
    StepFailed {
        package: String,
        index: usize,
        command: String,
        status: String,
    },

    /// Step command could not be spawned
    #[error("Failed to spawn '{command}' for '{package}': {error}")]
    SpawnFailed {
        package: String,
        command: String,
        error: String,
    },

    /// Build was cancelled before completion
    #[error("Build of '{package}' was cancelled")]
    Cancelled { package: String },

    /// A prerequisite of this package failed, so it was never built
    #[error("Prerequisite '{dependency}' of '{package}' failed")]
    PrerequisiteFailed { package: String, dependency: String },

    /// IO error in the build working directory
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Installation (publish) errors
#[derive(Error, Debug)]
pub enum InstallError {
    /// Staged artifacts could not be published into the prefix
    #[error("Failed to publish '{package}' into '{prefix}': {error}")]
    PublishFailed {
        package: String,
        prefix: PathBuf,
        error: String,
    },

    /// IO error under the install prefix
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Top-level cellar error type
#[derive(Error, Debug)]
pub enum CellarError {
    /// Descriptor error
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Download error
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Install error
    #[error("Install error: {0}")]
    Install(#[from] InstallError),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

impl CellarError {
    /// Process exit code for this failure class.
    ///
    /// 1 = parse/resolution failure, 2 = fetch/verify failure,
    /// 3 = build/install failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CellarError::Descriptor(_) | CellarError::Resolver(_) | CellarError::Generic(_) => 1,
            CellarError::Download(_) => 2,
            CellarError::Build(_) | CellarError::Install(_) => 3,
        }
    }
}
