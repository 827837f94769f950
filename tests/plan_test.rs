//! Integration tests for `cellar plan`
//!
//! - Prints the dependency-ordered install plan without touching the
//!   network or the prefix
//! - Dependencies always precede their dependents
//! - Resolution errors (unknown target, missing dependency, cycle) exit
//!   with code 1

mod common;

use common::{stdout, TestProject, EMPTY_SHA256};

fn simple_descriptor(name: &str, deps: &[&str]) -> String {
    common::marker_descriptor(
        name,
        &format!("https://example.invalid/{name}.tar.gz"),
        EMPTY_SHA256,
        deps,
    )
}

#[test]
fn test_plan_orders_dependencies_first() {
    let project = TestProject::new();
    project.write_descriptor("app", &simple_descriptor("app", &["lib"]));
    project.write_descriptor("lib", &simple_descriptor("lib", &["base"]));
    project.write_descriptor("base", &simple_descriptor("base", &[]));

    let output = project.run(&["plan", "app"]);

    assert!(output.status.success());
    let text = stdout(&output);
    let base_pos = text.find("base").expect("base missing from plan");
    let lib_pos = text.find("lib v").expect("lib missing from plan");
    let app_pos = text.find("app v").expect("app missing from plan");
    assert!(base_pos < lib_pos && lib_pos < app_pos, "plan out of order:\n{text}");
}

#[test]
fn test_plan_makes_no_network_requests() {
    // The source URL is unreachable; planning must still succeed.
    let project = TestProject::new();
    project.write_descriptor("solo", &simple_descriptor("solo", &[]));

    let output = project.run(&["plan", "solo"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("1 packages"));
}

#[test]
fn test_plan_unknown_target_exits_one() {
    let project = TestProject::new();
    project.write_descriptor("solo", &simple_descriptor("solo", &[]));

    let output = project.run(&["plan", "ghost"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_plan_cycle_reported_with_path() {
    let project = TestProject::new();
    project.write_descriptor("a", &simple_descriptor("a", &["b"]));
    project.write_descriptor("b", &simple_descriptor("b", &["a"]));

    let output = project.run(&["plan", "a"]);

    assert_eq!(output.status.code(), Some(1));
    let err = common::stderr(&output);
    assert!(err.contains("a -> b -> a") || err.contains("b -> a -> b"), "stderr: {err}");
}

#[test]
fn test_plan_missing_dependency_exits_one() {
    let project = TestProject::new();
    project.write_descriptor("app", &simple_descriptor("app", &["ghost"]));

    let output = project.run(&["plan", "app"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(common::stderr(&output).contains("ghost"));
}

#[test]
fn test_plan_optional_dependency_needs_flag() {
    let project = TestProject::new();
    let mut app = simple_descriptor("app", &[]);
    app.push_str("\n[[dependencies]]\nname = \"extra\"\nkind = \"optional\"\n");
    project.write_descriptor("app", &app);
    project.write_descriptor("extra", &simple_descriptor("extra", &[]));

    let without = project.run(&["plan", "app"]);
    assert!(without.status.success());
    assert!(!stdout(&without).contains("extra"));

    let with = project.run(&["plan", "app", "--with-optional"]);
    assert!(with.status.success());
    assert!(stdout(&with).contains("extra"));
}
