//! Integration tests for `cellar check`
//!
//! - Validates every descriptor in the pool without building
//! - Reports malformed descriptors with exit code 1
//! - Warns about build tools missing from PATH without failing

mod common;

use common::{stdout, TestProject, EMPTY_SHA256};

fn descriptor_running(name: &str, tool: &str) -> String {
    format!(
        r#"
[package]
name = "{name}"
version = "1.0"

[source]
url = "https://example.invalid/{name}.tar.gz"
sha256 = "{EMPTY_SHA256}"

[[steps]]
run = "{tool}"
"#
    )
}

#[test]
fn test_check_valid_pool_succeeds() {
    let project = TestProject::new();
    project.write_descriptor("a", &descriptor_running("a", "sh"));
    project.write_descriptor("b", &descriptor_running("b", "sh"));

    let output = project.run(&["check"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("2 descriptor(s) valid"), "stdout: {text}");
}

#[test]
fn test_check_malformed_descriptor_exits_one() {
    let project = TestProject::new();
    project.write_descriptor("broken", "[package\nname =");

    let output = project.run(&["check"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_check_missing_digest_exits_one() {
    let project = TestProject::new();
    let mut toml = descriptor_running("a", "sh");
    toml = toml.replace(EMPTY_SHA256, "not-a-digest");
    project.write_descriptor("a", &toml);

    let output = project.run(&["check"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_check_warns_about_missing_tool() {
    let project = TestProject::new();
    project.write_descriptor(
        "odd",
        &descriptor_running("odd", "definitely-not-a-real-tool-xyz"),
    );

    let output = project.run(&["check"]);

    // A missing tool is a warning, not an error.
    assert!(output.status.success());
    assert!(stdout(&output).contains("definitely-not-a-real-tool-xyz"));
}

#[test]
fn test_check_target_resolves_plan() {
    let project = TestProject::new();
    let mut app = descriptor_running("app", "sh");
    app.push_str("\n[[dependencies]]\nname = \"lib\"\n");
    project.write_descriptor("app", &app);
    project.write_descriptor("lib", &descriptor_running("lib", "sh"));

    let output = project.run(&["check", "app"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("2 package(s)"));
}

#[test]
fn test_check_detects_cycle_anywhere_in_pool() {
    let project = TestProject::new();
    let mut a = descriptor_running("a", "sh");
    a.push_str("\n[[dependencies]]\nname = \"b\"\n");
    let mut b = descriptor_running("b", "sh");
    b.push_str("\n[[dependencies]]\nname = \"a\"\n");
    project.write_descriptor("a", &a);
    project.write_descriptor("b", &b);

    let output = project.run(&["check"]);

    assert_eq!(output.status.code(), Some(1));
}
