//! Check command implementation
//!
//! Implements `cellar check`: validate every descriptor in the pool (or
//! one package's plan), confirm the plan resolves, and warn about build
//! tools missing from PATH. Nothing is fetched or built.

use std::collections::BTreeSet;
use std::path::Path;

use crate::cli::output::status;
use crate::core::descriptor::Descriptor;
use crate::core::resolver::resolve;
use crate::error::CellarError;

/// Execute the check command
pub fn execute(
    target: Option<&str>,
    pool_dir: &Path,
    with_optional: bool,
    platform: Option<&str>,
) -> Result<(), CellarError> {
    let platform = super::resolve_platform(platform)?;

    // Loading already parses and validates every descriptor.
    let pool = super::load_pool(pool_dir, platform)?;
    println!("{} {} descriptor(s) valid", status::SUCCESS, pool.len());

    let checked: Vec<&Descriptor> = match target {
        Some(name) => {
            let plan = resolve(&pool, name, with_optional)?;
            println!(
                "{} '{name}' resolves to {} package(s)",
                status::SUCCESS,
                plan.len()
            );
            let names = plan.names();
            names.into_iter().filter_map(|n| pool.get(n)).collect()
        }
        None => {
            // Resolve every package so cycles anywhere in the pool surface.
            for name in pool.names() {
                resolve(&pool, name, with_optional)?;
            }
            println!("{} all packages resolve", status::SUCCESS);
            pool.names().filter_map(|n| pool.get(n)).collect()
        }
    };

    let missing = missing_tools(&checked);
    if missing.is_empty() {
        println!("{} all build tools found in PATH", status::SUCCESS);
    } else {
        for tool in &missing {
            println!("{} build tool not found in PATH: {tool}", status::WARNING);
        }
    }

    Ok(())
}

/// Step commands that cannot be found on PATH.
///
/// Commands containing `${...}` are skipped; they can only be resolved
/// inside a build context.
fn missing_tools(descriptors: &[&Descriptor]) -> Vec<String> {
    let mut tools = BTreeSet::new();
    for descriptor in descriptors {
        for step in &descriptor.steps {
            tools.insert(step.run.clone());
        }
    }

    tools
        .into_iter()
        .filter(|tool| !tool.contains("${") && which::which(tool).is_err())
        .collect()
}
