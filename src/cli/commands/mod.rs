//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod check;
pub mod fetch;
pub mod install;
pub mod plan;

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::config::defaults;
use crate::core::platform::Platform;
use crate::core::pool::DescriptorPool;
use crate::error::CellarError;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve, fetch, build, and install a package and its dependencies
    Install {
        /// Package to install
        target: String,

        /// Descriptor pool directory
        #[arg(long, env = "CELLAR_POOL", default_value = defaults::DEFAULT_POOL_DIR)]
        pool: PathBuf,

        /// Install prefix
        #[arg(long, env = "CELLAR_PREFIX")]
        prefix: Option<PathBuf>,

        /// Maximum concurrent package builds
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Also install optional dependencies
        #[arg(long)]
        with_optional: bool,

        /// Keep building unrelated packages after a failure
        #[arg(long)]
        keep_going: bool,

        /// Re-download sources even when cached copies verify
        #[arg(short, long)]
        force: bool,

        /// Override the detected platform (linux, macos)
        #[arg(long)]
        platform: Option<String>,
    },

    /// Show the resolved install order without building anything
    Plan {
        /// Package to plan for
        target: String,

        /// Descriptor pool directory
        #[arg(long, env = "CELLAR_POOL", default_value = defaults::DEFAULT_POOL_DIR)]
        pool: PathBuf,

        /// Also include optional dependencies
        #[arg(long)]
        with_optional: bool,

        /// Override the detected platform (linux, macos)
        #[arg(long)]
        platform: Option<String>,
    },

    /// Validate descriptors and report missing build tools
    Check {
        /// Limit the check to one package and its dependencies
        target: Option<String>,

        /// Descriptor pool directory
        #[arg(long, env = "CELLAR_POOL", default_value = defaults::DEFAULT_POOL_DIR)]
        pool: PathBuf,

        /// Also follow optional dependencies
        #[arg(long)]
        with_optional: bool,

        /// Override the detected platform (linux, macos)
        #[arg(long)]
        platform: Option<String>,
    },

    /// Download and verify sources without building
    Fetch {
        /// Package whose plan should be prefetched
        target: String,

        /// Descriptor pool directory
        #[arg(long, env = "CELLAR_POOL", default_value = defaults::DEFAULT_POOL_DIR)]
        pool: PathBuf,

        /// Number of parallel downloads
        #[arg(short, long, default_value = "4")]
        parallel: usize,

        /// Force re-download even if files exist
        #[arg(short, long)]
        force: bool,

        /// Also fetch optional dependencies
        #[arg(long)]
        with_optional: bool,

        /// Override the detected platform (linux, macos)
        #[arg(long)]
        platform: Option<String>,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<(), CellarError> {
        match self {
            Self::Install {
                target,
                pool,
                prefix,
                jobs,
                with_optional,
                keep_going,
                force,
                platform,
            } => {
                let options = install::InstallArgs {
                    prefix,
                    jobs,
                    with_optional,
                    keep_going,
                    force,
                };
                install::execute(&target, &pool, options, platform.as_deref()).await
            }
            Self::Plan {
                target,
                pool,
                with_optional,
                platform,
            } => plan::execute(&target, &pool, with_optional, platform.as_deref()),
            Self::Check {
                target,
                pool,
                with_optional,
                platform,
            } => check::execute(target.as_deref(), &pool, with_optional, platform.as_deref()),
            Self::Fetch {
                target,
                pool,
                parallel,
                force,
                with_optional,
                platform,
            } => {
                fetch::execute(
                    &target,
                    &pool,
                    parallel,
                    force,
                    with_optional,
                    platform.as_deref(),
                )
                .await
            }
        }
    }
}

/// Parse a `--platform` override, falling back to the host platform.
fn resolve_platform(platform: Option<&str>) -> Result<Platform, CellarError> {
    match platform {
        Some(tag) => tag.parse().map_err(CellarError::Generic),
        None => Ok(Platform::current()),
    }
}

/// Load the descriptor pool for the selected platform.
fn load_pool(dir: &Path, platform: Platform) -> Result<DescriptorPool, CellarError> {
    let pool = DescriptorPool::load(dir, platform)?;
    tracing::info!(
        descriptors = pool.len(),
        dir = %dir.display(),
        %platform,
        "loaded descriptor pool"
    );
    Ok(pool)
}
