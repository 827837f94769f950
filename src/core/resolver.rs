//! Dependency resolution
//!
//! Computes the install order for a target descriptor: a depth-first
//! traversal over dependency edges with three-state marking, so every
//! prerequisite lands strictly before its dependents and cycles are
//! reported instead of looping.

use std::collections::HashMap;

use crate::core::descriptor::Descriptor;
use crate::core::pool::DescriptorPool;
use crate::error::ResolverError;

/// Dependency-ordered sequence of descriptors to install.
///
/// Immutable once computed; created per install request and discarded after
/// use. The requested target is always the last entry.
#[derive(Debug)]
pub struct ResolutionPlan {
    entries: Vec<Descriptor>,
}

impl ResolutionPlan {
    /// Descriptors in install order
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.entries.iter()
    }

    /// Package names in install order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Descriptor::name).collect()
    }

    /// Number of descriptors in the plan
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Compute the install order for `target`.
///
/// Build and runtime edges are always followed; optional edges only when
/// `include_optional` is set. Dependencies of each node are visited in
/// name order, so plans are deterministic across runs.
pub fn resolve(
    pool: &DescriptorPool,
    target: &str,
    include_optional: bool,
) -> Result<ResolutionPlan, ResolverError> {
    if pool.get(target).is_none() {
        return Err(ResolverError::UnknownTarget {
            name: target.to_string(),
        });
    }

    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut path: Vec<String> = Vec::new();
    let mut order: Vec<String> = Vec::new();

    visit(pool, target, None, include_optional, &mut marks, &mut path, &mut order)?;

    let entries = order
        .iter()
        .map(|name| pool.get(name).cloned().expect("visited names are in the pool"))
        .collect();

    Ok(ResolutionPlan { entries })
}

fn visit(
    pool: &DescriptorPool,
    name: &str,
    requested_by: Option<&str>,
    include_optional: bool,
    marks: &mut HashMap<String, Mark>,
    path: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<(), ResolverError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            // Found a cycle; report the path from the first occurrence back
            // to the repeated node.
            let start = path.iter().position(|n| n == name).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(ResolverError::CircularDependency { cycle });
        }
        None => {}
    }

    let Some(descriptor) = pool.get(name) else {
        return Err(ResolverError::MissingDependency {
            package: requested_by.unwrap_or("<root>").to_string(),
            dependency: name.to_string(),
        });
    };

    marks.insert(name.to_string(), Mark::InProgress);
    path.push(name.to_string());

    let mut dependencies = descriptor.dependency_names(include_optional);
    dependencies.sort_unstable();
    dependencies.dedup();

    for dependency in dependencies {
        visit(pool, dependency, Some(name), include_optional, marks, path, order)?;
    }

    path.pop();
    marks.insert(name.to_string(), Mark::Done);
    order.push(name.to_string());

    Ok(())
}
