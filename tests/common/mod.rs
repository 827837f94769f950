//! Common test utilities and helpers
//!
//! Shared setup for integration tests: a temporary project with a
//! descriptor pool, an install prefix, and an isolated home directory so
//! the download cache never touches the real one.

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// SHA-256 of the empty string
#[allow(dead_code)]
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Test project context
pub struct TestProject {
    /// Temporary root holding pool/, prefix/, and home/
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        for sub in ["pool", "prefix", "home"] {
            std::fs::create_dir_all(dir.path().join(sub)).expect("Failed to create subdirectory");
        }
        Self { dir }
    }

    /// Descriptor pool directory
    pub fn pool(&self) -> PathBuf {
        self.dir.path().join("pool")
    }

    /// Install prefix directory
    pub fn prefix(&self) -> PathBuf {
        self.dir.path().join("prefix")
    }

    /// Write a descriptor into the pool
    pub fn write_descriptor(&self, name: &str, content: &str) {
        std::fs::write(self.pool().join(format!("{name}.toml")), content)
            .expect("Failed to write descriptor");
    }

    /// Run the cellar binary with the pool preconfigured and an isolated
    /// home directory
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cellar"));
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path().join("home"))
            .env("CELLAR_POOL", self.pool());
        for arg in args {
            cmd.arg(arg);
        }
        cmd.output().expect("Failed to execute cellar")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdout of a finished command as UTF-8
#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Stderr of a finished command as UTF-8
#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// TOML for a descriptor that installs a marker file via `sh`.
///
/// The digest must match whatever archive the test serves for `url`.
#[allow(dead_code)]
pub fn marker_descriptor(name: &str, url: &str, digest: &str, deps: &[&str]) -> String {
    let mut toml = format!(
        r#"
[package]
name = "{name}"
version = "1.0"

[source]
url = "{url}"
sha256 = "{digest}"
"#
    );
    for dep in deps {
        toml.push_str(&format!("\n[[dependencies]]\nname = \"{dep}\"\n"));
    }
    toml.push_str(&format!(
        r#"
[[steps]]
run = "sh"
args = ["-c", "mkdir -p ${{DESTDIR}} && echo {name} > ${{DESTDIR}}/marker"]
"#
    ));
    toml
}
