//! Descriptor pool
//!
//! Loads every descriptor in a directory, validates them, and resolves
//! platform conditions up front. The pool is read-only after load.

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::descriptor::Descriptor;
use crate::core::platform::Platform;
use crate::error::DescriptorError;

/// Read-only collection of platform-resolved descriptors, keyed by name
#[derive(Debug, Default)]
pub struct DescriptorPool {
    descriptors: BTreeMap<String, Descriptor>,
}

impl DescriptorPool {
    /// Load all `*.toml` descriptors from a directory.
    ///
    /// Every descriptor is parsed, validated, and platform-resolved for
    /// `platform` before the pool is returned, so any malformed descriptor
    /// fails the whole load (fail fast, before any network side effects).
    pub fn load(dir: &Path, platform: Platform) -> Result<Self, DescriptorError> {
        if !dir.is_dir() {
            return Err(DescriptorError::PoolNotFound {
                path: dir.to_path_buf(),
            });
        }

        let entries = std::fs::read_dir(dir).map_err(|e| DescriptorError::Io {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut pool = Self::default();
        for entry in entries {
            let entry = entry.map_err(|e| DescriptorError::Io {
                path: dir.to_path_buf(),
                error: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let content = std::fs::read_to_string(&path).map_err(|e| DescriptorError::Io {
                path: path.clone(),
                error: e.to_string(),
            })?;
            let origin = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("<descriptor>");
            let descriptor = Descriptor::parse(&content, origin)?.for_platform(platform);

            tracing::debug!(package = descriptor.name(), file = origin, "loaded descriptor");
            pool.insert(descriptor)?;
        }

        Ok(pool)
    }

    /// Build a pool from already-resolved descriptors.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = Descriptor>,
    ) -> Result<Self, DescriptorError> {
        let mut pool = Self::default();
        for descriptor in descriptors {
            pool.insert(descriptor)?;
        }
        Ok(pool)
    }

    fn insert(&mut self, descriptor: Descriptor) -> Result<(), DescriptorError> {
        let name = descriptor.name().to_string();
        if self.descriptors.contains_key(&name) {
            return Err(DescriptorError::Duplicate { package: name });
        }
        self.descriptors.insert(name, descriptor);
        Ok(())
    }

    /// Look up a descriptor by package name
    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.get(name)
    }

    /// All package names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    /// Number of descriptors in the pool
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::descriptor_toml;
    use tempfile::TempDir;

    fn write_pool(files: &[(&str, String)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_reads_only_toml_files() {
        let dir = write_pool(&[
            ("a.toml", descriptor_toml("a", &[])),
            ("README.md", "not a descriptor".to_string()),
        ]);

        let pool = DescriptorPool::load(dir.path(), Platform::Linux).unwrap();
        assert_eq!(pool.len(), 1);
        assert!(pool.get("a").is_some());
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let result = DescriptorPool::load(Path::new("/nonexistent/pool"), Platform::Linux);
        assert!(matches!(result, Err(DescriptorError::PoolNotFound { .. })));
    }

    #[test]
    fn test_duplicate_package_name_fails() {
        let dir = write_pool(&[
            ("one.toml", descriptor_toml("dup", &[])),
            ("two.toml", descriptor_toml("dup", &[])),
        ]);

        let result = DescriptorPool::load(dir.path(), Platform::Linux);
        assert!(matches!(result, Err(DescriptorError::Duplicate { .. })));
    }

    #[test]
    fn test_malformed_descriptor_fails_whole_load() {
        let dir = write_pool(&[
            ("a.toml", descriptor_toml("a", &[])),
            ("bad.toml", "[package\nname=".to_string()),
        ]);

        let result = DescriptorPool::load(dir.path(), Platform::Linux);
        assert!(matches!(result, Err(DescriptorError::Malformed { .. })));
    }

    #[test]
    fn test_names_sorted() {
        let dir = write_pool(&[
            ("z.toml", descriptor_toml("zeta", &[])),
            ("a.toml", descriptor_toml("alpha", &[])),
        ]);

        let pool = DescriptorPool::load(dir.path(), Platform::Linux).unwrap();
        let names: Vec<_> = pool.names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
