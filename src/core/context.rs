//! Build context
//!
//! An ephemeral, exclusively-owned workspace for one package build: a
//! scoped temporary directory holding the source area and the staging area,
//! plus the environment overlay for the package's steps. The whole tree is
//! removed when the context is dropped, on every exit path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::descriptor::Descriptor;
use crate::core::fetch::FetchedSources;
use crate::core::template::expand_vars;
use crate::error::BuildError;

/// Isolated workspace for one package build
#[derive(Debug)]
pub struct BuildContext {
    package: String,
    version: String,
    workdir: TempDir,
    srcdir: PathBuf,
    staging: PathBuf,
    prefix: PathBuf,
    env: BTreeMap<String, String>,
    jobs: usize,
    archive: Option<PathBuf>,
    patches: Vec<PathBuf>,
}

impl BuildContext {
    /// Create a fresh context for `descriptor`, targeting `prefix`.
    pub fn create(descriptor: &Descriptor, prefix: &Path, jobs: usize) -> Result<Self, BuildError> {
        let workdir = tempfile::Builder::new()
            .prefix(&format!("cellar-{}-", descriptor.name()))
            .tempdir()
            .map_err(|e| BuildError::Io {
                path: std::env::temp_dir(),
                error: e.to_string(),
            })?;

        let srcdir = workdir.path().join("src");
        let staging = workdir.path().join("stage");
        for dir in [&srcdir, &staging] {
            std::fs::create_dir_all(dir).map_err(|e| BuildError::Io {
                path: dir.clone(),
                error: e.to_string(),
            })?;
        }

        Ok(Self {
            package: descriptor.name().to_string(),
            version: descriptor.version().to_string(),
            workdir,
            srcdir,
            staging,
            prefix: prefix.to_path_buf(),
            env: descriptor.env.clone(),
            jobs: jobs.max(1),
            archive: None,
            patches: Vec::new(),
        })
    }

    /// Copy the fetched archive and patches into the source area.
    ///
    /// Steps see them through `${ARCHIVE}` and as plain files next to it;
    /// extraction is the descriptor's business (`tar xf ${ARCHIVE}` or
    /// similar), keeping external tools the only build contract.
    pub fn stage_inputs(&mut self, sources: &FetchedSources) -> Result<(), BuildError> {
        let archive_dest = self.copy_in(&sources.archive)?;
        self.archive = Some(archive_dest);

        for patch in &sources.patches {
            let dest = self.copy_in(patch)?;
            self.patches.push(dest);
        }

        Ok(())
    }

    fn copy_in(&self, src: &Path) -> Result<PathBuf, BuildError> {
        let name = src
            .file_name()
            .ok_or_else(|| BuildError::Io {
                path: src.to_path_buf(),
                error: "source file has no name".to_string(),
            })?
            .to_owned();
        let dest = self.srcdir.join(name);
        std::fs::copy(src, &dest).map_err(|e| BuildError::Io {
            path: dest.clone(),
            error: e.to_string(),
        })?;
        Ok(dest)
    }

    /// Package name
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Directory build steps run in
    pub fn srcdir(&self) -> &Path {
        &self.srcdir
    }

    /// Staging area steps install into (`${DESTDIR}`)
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// Final install prefix root
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Where this package will live once published
    pub fn install_dir(&self) -> PathBuf {
        self.prefix.join(&self.package)
    }

    /// Variables visible to this package's steps.
    ///
    /// Built-ins first, then the descriptor's overlay expanded against the
    /// built-ins. The overlay is scoped to this context; the process-wide
    /// environment is never mutated.
    pub fn vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("NAME".to_string(), self.package.clone());
        vars.insert("VERSION".to_string(), self.version.clone());
        vars.insert(
            "PREFIX".to_string(),
            self.install_dir().display().to_string(),
        );
        vars.insert("DESTDIR".to_string(), self.staging.display().to_string());
        vars.insert("SRCDIR".to_string(), self.srcdir.display().to_string());
        vars.insert("JOBS".to_string(), self.jobs.to_string());
        if let Some(ref archive) = self.archive {
            vars.insert("ARCHIVE".to_string(), archive.display().to_string());
        }

        let overlay: Vec<(String, String)> = self
            .env
            .iter()
            .map(|(key, value)| (key.clone(), expand_vars(value, &vars)))
            .collect();
        vars.extend(overlay);

        vars
    }
}
