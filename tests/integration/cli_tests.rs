use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn dupestash() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dupestash"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let base = fs::canonicalize(dir.path()).unwrap();
    let tree = base.join("tree");
    fs::create_dir(&tree).unwrap();
    fs::write(tree.join("a"), "X").unwrap();
    fs::write(tree.join("b"), "X").unwrap();
    fs::write(tree.join("c"), "Y").unwrap();
    (dir, tree, base.join("dupes"))
}

#[test]
fn test_gather_and_restore_messages() {
    let (_dir, tree, archive) = setup();

    dupestash()
        .arg("-q")
        .arg("gather")
        .arg(&archive)
        .arg("--root")
        .arg(&tree)
        .assert()
        .success()
        .stdout(format!("Gathered 1 duplicates into '{}'\n", archive.display()));

    assert!(!tree.join("b").exists());

    dupestash()
        .arg("-q")
        .arg("restore")
        .arg(&archive)
        .assert()
        .success()
        .stdout(format!("Extracted 1 duplicates from '{}'\n", archive.display()));

    assert!(tree.join("b").exists());
    assert!(!archive.exists());
}

#[test]
fn test_gather_defaults_to_current_directory() {
    let (_dir, tree, archive) = setup();

    dupestash()
        .current_dir(&tree)
        .args(["-q", "gather"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Gathered 1 duplicates"));
}

#[test]
fn test_found_lines_are_logged() {
    let (_dir, tree, archive) = setup();

    dupestash()
        .arg("gather")
        .arg(&archive)
        .arg("--root")
        .arg(&tree)
        .assert()
        .success()
        .stderr(predicate::str::contains("Found b"));
}

#[test]
fn test_delete_alias() {
    let (_dir, tree, archive) = setup();
    dupestash()
        .args(["-q", "gather"])
        .arg(&archive)
        .arg("--root")
        .arg(&tree)
        .assert()
        .success();

    dupestash()
        .args(["-q", "delete"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Extracted 1 duplicates"));
}

#[test]
fn test_conflict_exit_code_and_prefix() {
    let (_dir, tree, _archive) = setup();

    dupestash()
        .arg("gather")
        .arg(tree.join("inside"))
        .arg("--root")
        .arg(&tree)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("[DS003] Error:"));

    assert!(!tree.join("inside").exists());
}

#[test]
fn test_restore_missing_exit_code_and_prefix() {
    let (_dir, _tree, archive) = setup();

    dupestash()
        .arg("restore")
        .arg(&archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[DS002] Error:"));
}

#[test]
fn test_json_errors() {
    let (_dir, _tree, archive) = setup();

    let output = dupestash()
        .args(["-q", "--json-errors", "restore"])
        .arg(&archive)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(value["code"], "DS002");
    assert_eq!(value["category"], "not_found");
    assert_eq!(value["exit_code"], 1);
}

#[test]
fn test_usage_errors_exit_one() {
    dupestash()
        .args(["shuffle", "somewhere"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));

    dupestash().arg("gather").assert().code(1);
    dupestash().assert().code(1);
}

#[test]
fn test_help_and_version_exit_zero() {
    dupestash()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("gather"));

    dupestash()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
