//! Command-line behaviour: exit codes, output formats and flags.

mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::prelude::*;

fn moduleaudit() -> Command {
    let mut cmd = Command::cargo_bin("moduleaudit").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

/// `:app` declares `:lib1` without using it.
fn unused_lib() -> TestWorkspace {
    let workspace = TestWorkspace::new()
        .project(":lib1", "")
        .exports(":lib1", "main", &["com.example.lib1.Lib1Class"])
        .project(":app", "dependencies {\n  implementation(project(\":lib1\"))\n}\n")
        .references(":app", "main", &["kotlin.String"]);
    workspace.write_snapshot();
    workspace
}

fn clean() -> TestWorkspace {
    let workspace = TestWorkspace::new()
        .project(":lib1", "")
        .exports(":lib1", "main", &["com.example.lib1.Lib1Class"])
        .project(":app", "dependencies {\n  implementation(project(\":lib1\"))\n}\n")
        .references(":app", "main", &["com.example.lib1.Lib1Class"]);
    workspace.write_snapshot();
    workspace
}

#[test]
fn test_report_only_run_fails_with_findings() {
    let workspace = unused_lib();
    moduleaudit()
        .arg(workspace.root())
        .arg("--no-autocorrect")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("ModuleAudit found 1 issue"))
        .stdout(predicate::str::contains("unused-dependency"));

    assert!(workspace.build_file(":app").contains("  implementation(project(\":lib1\"))\n"));
}

#[test]
fn test_auto_correct_run_succeeds() {
    let workspace = unused_lib();
    moduleaudit()
        .arg(workspace.root())
        .arg("--auto-correct")
        .arg("--delete-unused")
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 auto-corrected)"));

    assert!(!workspace.build_file(":app").contains(":lib1"));
}

#[test]
fn test_clean_workspace() {
    let workspace = clean();
    moduleaudit()
        .arg(workspace.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("ModuleAudit found 0 issues"));
}

#[test]
fn test_json_output() {
    let workspace = unused_lib();
    let output = moduleaudit()
        .arg(workspace.root())
        .args(["--no-autocorrect", "--format", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["issueCount"], 1);
    assert_eq!(report["findings"][0]["ruleName"], "unused-dependency");
    assert_eq!(report["findings"][0]["project"], ":app");
    assert_eq!(report["findings"][0]["fixed"], false);
}

#[test]
fn test_json_output_file() {
    let workspace = clean();
    let target = workspace.root().join("build/report.json");
    moduleaudit()
        .arg(workspace.root())
        .args(["--format", "json", "--output"])
        .arg(&target)
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(report["issueCount"], 0);
}

#[test]
fn test_depths_report() {
    let workspace = clean();
    moduleaudit()
        .arg(workspace.root())
        .arg("--depths")
        .assert()
        .success()
        .stdout(predicate::str::contains("-- ModuleAudit main source set depth results --"))
        .stdout(predicate::str::contains(":app"));
}

#[test]
fn test_settings_file_in_workspace_root() {
    let workspace = unused_lib();
    workspace.write("moduleaudit.toml", "auto_correct = false\n");
    moduleaudit()
        .arg(workspace.root())
        .assert()
        .failure()
        .stdout(predicate::str::contains("ModuleAudit found 1 issue"));
    assert!(workspace.build_file(":app").contains("implementation(project(\":lib1\"))"));
}

#[test]
fn test_explicit_snapshot_path() {
    let workspace = clean();
    let snapshot = workspace.write_snapshot();
    let elsewhere = tempfile::TempDir::new().unwrap();
    moduleaudit()
        .arg(elsewhere.path())
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .success();
}

#[test]
fn test_missing_snapshot() {
    let dir = tempfile::TempDir::new().unwrap();
    moduleaudit()
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no workspace snapshot found"));
}

#[test]
fn test_conflicting_auto_correct_flags() {
    moduleaudit()
        .args(["--auto-correct", "--no-autocorrect"])
        .assert()
        .failure();
}

#[test]
fn test_completions() {
    moduleaudit()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("moduleaudit"));
}
