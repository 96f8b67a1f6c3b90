use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STORE: &str = r#"[
  { "groupId": "g", "artifactId": "app", "versionId": "1",
    "projectId": "app-project",
    "dependencies": [
      { "groupId": "g", "artifactId": "web", "versionId": "1" },
      { "groupId": "g", "artifactId": "log", "versionId": "2" }
    ] },
  { "groupId": "g", "artifactId": "web", "versionId": "1",
    "dependencies": [ { "groupId": "g", "artifactId": "log", "versionId": "1" } ] },
  { "groupId": "g", "artifactId": "log", "versionId": "1" },
  { "groupId": "g", "artifactId": "log", "versionId": "2" },
  { "groupId": "g", "artifactId": "broken", "versionId": "1",
    "dependencies": [ { "groupId": "g", "artifactId": "gone", "versionId": "1" } ] }
]"#;

fn setup() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store.json");
    fs::write(&store, STORE).unwrap();
    (tmp, store)
}

fn depot_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("depot").unwrap();
    cmd.env("DEPOT_HOME", home).env_remove("DEPOT_STORE");
    cmd
}

#[test]
fn test_missing_store_is_config_error() {
    let tmp = TempDir::new().unwrap();
    depot_cmd(tmp.path())
        .arg("conflicts")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No store file given"));
}

#[test]
fn test_store_path_from_config() {
    let (tmp, store) = setup();
    fs::write(
        tmp.path().join("config.toml"),
        format!("[store]\npath = {:?}\n", store.display().to_string()),
    )
    .unwrap();

    depot_cmd(tmp.path())
        .args(["deps", "g:app:1", "--direct"])
        .assert()
        .success()
        .stdout(predicate::str::contains("g:web:1"))
        .stdout(predicate::str::contains("g:log:2"));
}

#[test]
fn test_deps_transitive() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["deps", "g:app:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("g:log:1"))
        .stdout(predicate::str::contains("g:log:2"))
        .stdout(predicate::str::contains("g:web:1"));
}

#[test]
fn test_deps_leaf_and_missing() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["deps", "g:log:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependencies."));

    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["deps", "g:broken:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependency not found: g:gone:1"));
}

#[test]
fn test_invalid_coordinate_argument() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["deps", "not-a-coordinate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected group:artifact:version"));
}

#[test]
fn test_conflicts_lists_closure_conflicts() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .arg("conflicts")
        .assert()
        .success()
        .stdout(predicate::str::contains("g:app:1"))
        .stdout(predicate::str::contains("g:log resolves to 1, 2"));
}

#[test]
fn test_dependents() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["dependents", "g:log:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("g:app:1"))
        .stdout(predicate::str::contains("g:web:1"));

    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["dependents", "g:log:1", "--direct"])
        .assert()
        .success()
        .stdout(predicate::str::contains("g:web:1"))
        .stdout(predicate::str::contains("g:app:1").not());
}

#[test]
fn test_report_requires_refresh() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["report", "g:app:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is invalid"));

    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .arg("refresh")
        .assert()
        .success()
        .stdout(predicate::str::contains("Refreshed 4 transitive reports (1 invalid)."));

    let saved = fs::read_to_string(&store).unwrap();
    assert!(saved.contains("transitiveDependenciesReport"));

    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["report", "g:app:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rootNodes\""))
        .stdout(predicate::str::contains("\"projectId\": \"app-project\""))
        .stdout(predicate::str::contains("\"conflicts\""));
}

#[test]
fn test_report_tree() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["report", "g:app:1", "--tree"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("g:app:1"))
        .stdout(predicate::str::contains("g:web:1"));
}

#[test]
fn test_resolve() {
    let (tmp, store) = setup();
    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["resolve", "g:web:1", "g:log:2", "--backtrack", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No compatible version set found."));

    depot_cmd(tmp.path())
        .arg("--store")
        .arg(&store)
        .args(["resolve", "g:web:1", "g:log:2", "--backtrack", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("g:web:1"))
        .stdout(predicate::str::contains("g:log:1"))
        .stdout(predicate::str::contains("g:log:2").not());
}
