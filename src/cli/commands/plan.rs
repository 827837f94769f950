//! Plan command implementation
//!
//! Implements `cellar plan` to show the resolved install order without
//! touching the network or the prefix.

use std::path::Path;

use crate::core::resolver::resolve;
use crate::error::CellarError;

/// Execute the plan command
pub fn execute(
    target: &str,
    pool_dir: &Path,
    with_optional: bool,
    platform: Option<&str>,
) -> Result<(), CellarError> {
    let platform = super::resolve_platform(platform)?;
    let pool = super::load_pool(pool_dir, platform)?;
    let plan = resolve(&pool, target, with_optional)?;

    println!("Install order for '{target}' ({} packages):", plan.len());
    for (index, descriptor) in plan.iter().enumerate() {
        println!(
            "  {}. {} v{}",
            index + 1,
            descriptor.name(),
            descriptor.version()
        );
    }

    Ok(())
}
