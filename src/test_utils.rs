//! Shared helpers for unit tests

use std::collections::BTreeMap;

use crate::core::descriptor::{
    Dependency, DependencyKind, Descriptor, PackageMetadata, Source, Step,
};

/// SHA-256 of the empty string; a syntactically valid digest for
/// descriptors whose sources are never fetched.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// A minimal valid descriptor with the given dependency edges.
pub fn descriptor(name: &str, deps: Vec<Dependency>) -> Descriptor {
    let mut descriptor = descriptor_with_source(
        name,
        &format!("https://example.com/{name}-1.0.tar.gz"),
        EMPTY_SHA256,
    );
    descriptor.dependencies = deps;
    descriptor
}

/// A minimal valid descriptor pointing at a specific source URL and digest.
pub fn descriptor_with_source(name: &str, url: &str, digest: &str) -> Descriptor {
    Descriptor {
        package: PackageMetadata {
            name: name.to_string(),
            version: "1.0".to_string(),
            license: None,
            homepage: None,
        },
        source: Source {
            url: url.to_string(),
            sha256: digest.to_string(),
        },
        dependencies: Vec::new(),
        patches: Vec::new(),
        steps: vec![Step {
            run: "true".to_string(),
            args: Vec::new(),
        }],
        env: BTreeMap::new(),
        caveats: None,
    }
}

/// A runtime dependency edge on `name`.
pub fn runtime_dep(name: &str) -> Dependency {
    Dependency {
        name: name.to_string(),
        kind: DependencyKind::Runtime,
        platform: None,
    }
}

/// An optional dependency edge on `name`.
pub fn optional_dep(name: &str) -> Dependency {
    Dependency {
        name: name.to_string(),
        kind: DependencyKind::Optional,
        platform: None,
    }
}

/// A step running `command` through `sh -c`.
pub fn shell_step(command: &str) -> Step {
    Step {
        run: "sh".to_string(),
        args: vec!["-c".to_string(), command.to_string()],
    }
}

/// TOML text for a minimal valid descriptor, for pool-loading tests.
pub fn descriptor_toml(name: &str, deps: &[&str]) -> String {
    let mut toml = format!(
        r#"
[package]
name = "{name}"
version = "1.0"

[source]
url = "https://example.com/{name}-1.0.tar.gz"
sha256 = "{EMPTY_SHA256}"
"#
    );
    for dep in deps {
        toml.push_str(&format!("\n[[dependencies]]\nname = \"{dep}\"\n"));
    }
    toml.push_str("\n[[steps]]\nrun = \"true\"\n");
    toml
}
