//! Publishing and caveats
//!
//! Installation is atomic per package: build steps install into the
//! context's staging area, and publishing copies that tree into a hidden
//! sibling directory under the prefix before a single rename makes it
//! visible. A partially-installed package is never observable at the final
//! prefix.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::context::BuildContext;
use crate::core::descriptor::Descriptor;
use crate::core::platform::Platform;
use crate::core::template::expand_vars;
use crate::error::InstallError;

/// Publish the staged artifacts into `<prefix>/<name>`.
///
/// Replaces any previously installed copy of the package. Returns the
/// final install directory.
pub fn publish(context: &BuildContext) -> Result<PathBuf, InstallError> {
    let package = context.package();
    let prefix = context.prefix();
    let dest = context.install_dir();
    let incoming = prefix.join(format!(".{package}.incoming"));

    std::fs::create_dir_all(prefix).map_err(|e| InstallError::Io {
        path: prefix.to_path_buf(),
        error: e.to_string(),
    })?;

    // A leftover incoming dir from a crashed run is stale; discard it.
    if incoming.exists() {
        std::fs::remove_dir_all(&incoming).map_err(|e| InstallError::Io {
            path: incoming.clone(),
            error: e.to_string(),
        })?;
    }

    if let Err(error) = copy_tree(context.staging(), &incoming) {
        let _ = std::fs::remove_dir_all(&incoming);
        return Err(InstallError::PublishFailed {
            package: package.to_string(),
            prefix: prefix.to_path_buf(),
            error,
        });
    }

    if dest.exists() {
        if let Err(e) = std::fs::remove_dir_all(&dest) {
            let _ = std::fs::remove_dir_all(&incoming);
            return Err(InstallError::PublishFailed {
                package: package.to_string(),
                prefix: prefix.to_path_buf(),
                error: e.to_string(),
            });
        }
    }

    if let Err(e) = std::fs::rename(&incoming, &dest) {
        let _ = std::fs::remove_dir_all(&incoming);
        return Err(InstallError::PublishFailed {
            package: package.to_string(),
            prefix: prefix.to_path_buf(),
            error: e.to_string(),
        });
    }

    tracing::info!(package, dest = %dest.display(), "published");
    Ok(dest)
}

/// Copy a directory tree, preserving the layout.
///
/// `fs::copy` carries permission bits on Unix, so executables stay
/// executable.
fn copy_tree(from: &Path, to: &Path) -> Result<(), String> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| e.to_string())?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| e.to_string())?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| e.to_string())?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

/// Render a descriptor's post-install message for `platform`.
///
/// Supports `${PREFIX}`, `${NAME}`, `${VERSION}`, and `${HOMEPAGE}`;
/// the platform note for the current platform is appended when present.
/// Returns `None` when the descriptor has nothing to say.
pub fn render_caveats(
    descriptor: &Descriptor,
    prefix: &Path,
    platform: Platform,
) -> Option<String> {
    let caveats = descriptor.caveats.as_ref()?;

    let mut vars = BTreeMap::new();
    vars.insert("NAME".to_string(), descriptor.name().to_string());
    vars.insert("VERSION".to_string(), descriptor.version().to_string());
    vars.insert(
        "PREFIX".to_string(),
        prefix.join(descriptor.name()).display().to_string(),
    );
    if let Some(ref homepage) = descriptor.package.homepage {
        vars.insert("HOMEPAGE".to_string(), homepage.clone());
    }

    let mut parts = Vec::new();
    if let Some(ref message) = caveats.message {
        parts.push(expand_vars(message, &vars));
    }
    if let Some(note) = caveats.platform_notes.get(platform.tag()) {
        parts.push(expand_vars(note, &vars));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
