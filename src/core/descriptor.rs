//! Package descriptor parsing and validation
//!
//! A descriptor is a declarative TOML recipe: where the source archive
//! lives, the digest it must hash to, which packages it depends on, patches
//! to fetch, and the ordered external commands that build and install it.
//!
//! Parsing is pure: no network or filesystem side effects beyond the caller
//! handing over the file content. Validation fails fast, before any
//! resolution or fetching happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::platform::Platform;
use crate::error::DescriptorError;

/// A validated package descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    /// Package identity and metadata
    pub package: PackageMetadata,

    /// Source archive location and digest
    pub source: Source,

    /// Dependency edges
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Patches fetched and verified alongside the source
    #[serde(default)]
    pub patches: Vec<Patch>,

    /// Ordered install steps, run as external processes
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Environment overlay applied to every step of this package only
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Post-install message
    #[serde(default)]
    pub caveats: Option<Caveats>,
}

/// Package identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackageMetadata {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// License identifier
    #[serde(default)]
    pub license: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,
}

/// Source archive: URL plus mandatory SHA-256 digest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Source {
    /// Download URL
    pub url: String,

    /// Expected SHA-256 digest (64 hex characters)
    pub sha256: String,
}

/// A dependency edge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    /// Name of the depended-on package
    pub name: String,

    /// Edge kind
    #[serde(default)]
    pub kind: DependencyKind,

    /// Platform condition; the edge only exists on this platform
    #[serde(default)]
    pub platform: Option<String>,
}

/// Dependency qualifier
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Needed to build the dependent
    Build,
    /// Needed at runtime
    #[default]
    Runtime,
    /// Only installed when optional dependencies are requested
    Optional,
}

impl DependencyKind {
    /// All recognized kind spellings
    pub const KNOWN: [&'static str; 3] = ["build", "runtime", "optional"];
}

/// A patch file: URL plus mandatory digest, optionally platform-gated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Patch {
    /// Download URL
    pub url: String,

    /// Expected SHA-256 digest
    pub sha256: String,

    /// Platform condition
    #[serde(default)]
    pub platform: Option<String>,
}

/// A single install step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Command to run
    pub run: String,

    /// Command arguments; `${VAR}` patterns are expanded before execution
    #[serde(default)]
    pub args: Vec<String>,
}

/// Post-install message, rendered after a successful install
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Caveats {
    /// Message template; supports `${PREFIX}`, `${NAME}`, `${VERSION}`,
    /// `${HOMEPAGE}`
    #[serde(default)]
    pub message: Option<String>,

    /// Extra note appended when installing on the keyed platform
    #[serde(default)]
    pub platform_notes: BTreeMap<String, String>,
}

impl Descriptor {
    /// Parse and validate a descriptor from TOML.
    ///
    /// `origin` labels the content in error messages (usually the file name).
    pub fn parse(content: &str, origin: &str) -> Result<Self, DescriptorError> {
        let value: toml::Value =
            toml::from_str(content).map_err(|e| DescriptorError::Malformed {
                origin: origin.to_string(),
                error: e.to_string(),
            })?;

        // Check dependency kinds on the raw value first so an unknown kind
        // is reported as such, not as a generic deserialization failure.
        check_dependency_kinds(&value, origin)?;

        let descriptor: Descriptor =
            value.try_into().map_err(|e: toml::de::Error| DescriptorError::Malformed {
                origin: origin.to_string(),
                error: e.to_string(),
            })?;

        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Validate required fields and digests.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let name = &self.package.name;

        if name.is_empty() {
            return Err(DescriptorError::MissingField {
                package: "<unnamed>".to_string(),
                field: "package.name".to_string(),
            });
        }
        if self.package.version.is_empty() {
            return Err(DescriptorError::MissingField {
                package: name.clone(),
                field: "package.version".to_string(),
            });
        }
        if self.source.url.is_empty() {
            return Err(DescriptorError::MissingField {
                package: name.clone(),
                field: "source.url".to_string(),
            });
        }
        if !is_sha256_hex(&self.source.sha256) {
            return Err(DescriptorError::InvalidDigest {
                package: name.clone(),
                artifact: self.source.url.clone(),
            });
        }
        for patch in &self.patches {
            if patch.url.is_empty() {
                return Err(DescriptorError::MissingField {
                    package: name.clone(),
                    field: "patches.url".to_string(),
                });
            }
            if !is_sha256_hex(&patch.sha256) {
                return Err(DescriptorError::InvalidDigest {
                    package: name.clone(),
                    artifact: patch.url.clone(),
                });
            }
        }
        if self.steps.is_empty() {
            return Err(DescriptorError::NoSteps {
                package: name.clone(),
            });
        }
        for step in &self.steps {
            if step.run.is_empty() {
                return Err(DescriptorError::MissingField {
                    package: name.clone(),
                    field: "steps.run".to_string(),
                });
            }
        }
        for dep in &self.dependencies {
            if dep.name.is_empty() {
                return Err(DescriptorError::MissingField {
                    package: name.clone(),
                    field: "dependencies.name".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Resolve platform conditions, dropping dependencies and patches that
    /// do not apply on `platform`. Evaluated once at pool load; later stages
    /// never see platform conditions.
    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> Self {
        let mut resolved = self.clone();
        resolved
            .dependencies
            .retain(|d| platform.matches(d.platform.as_deref()));
        resolved
            .patches
            .retain(|p| platform.matches(p.platform.as_deref()));
        resolved
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.package.name
    }

    /// Package version
    pub fn version(&self) -> &str {
        &self.package.version
    }

    /// Names of the dependencies the resolver should follow.
    ///
    /// Build and runtime edges are always included; optional edges only when
    /// `include_optional` is set.
    pub fn dependency_names(&self, include_optional: bool) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|d| include_optional || d.kind != DependencyKind::Optional)
            .map(|d| d.name.as_str())
            .collect()
    }
}

/// Whether a string is a plausible SHA-256 hex digest
fn is_sha256_hex(digest: &str) -> bool {
    digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
}

/// Report unknown dependency kinds from the raw TOML value.
fn check_dependency_kinds(value: &toml::Value, origin: &str) -> Result<(), DescriptorError> {
    let package = value
        .get("package")
        .and_then(|p| p.get("name"))
        .and_then(toml::Value::as_str)
        .unwrap_or(origin);

    let Some(deps) = value.get("dependencies").and_then(toml::Value::as_array) else {
        return Ok(());
    };

    for dep in deps {
        let Some(kind) = dep.get("kind").and_then(toml::Value::as_str) else {
            continue;
        };
        if !DependencyKind::KNOWN.contains(&kind) {
            let dependency = dep
                .get("name")
                .and_then(toml::Value::as_str)
                .unwrap_or("<unnamed>");
            return Err(DescriptorError::InvalidDependencyKind {
                package: package.to_string(),
                dependency: dependency.to_string(),
                kind: kind.to_string(),
            });
        }
    }

    Ok(())
}
