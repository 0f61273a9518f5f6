#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn controller() -> Command {
    let mut cmd = Command::cargo_bin("cronjob-controller").unwrap();
    cmd.env_remove("CRONJOB_CONFIG");
    cmd
}

// ---------------------------------------------------------------------------
// crd
// ---------------------------------------------------------------------------

#[test]
fn crd_prints_definition() {
    let output = controller().arg("crd").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let crd: serde_yaml::Value = serde_yaml::from_str(&stdout).unwrap();

    assert_eq!(crd["kind"].as_str(), Some("CustomResourceDefinition"));
    assert_eq!(
        crd["metadata"]["name"].as_str(),
        Some("cronjobs.batch.tutorial.kubebuilder.io")
    );
    assert_eq!(crd["spec"]["scope"].as_str(), Some("Namespaced"));
    assert_eq!(crd["spec"]["names"]["kind"].as_str(), Some("CronJob"));
}

#[test]
fn crd_json_output() {
    controller()
        .args(["crd", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"CustomResourceDefinition\""));
}

// ---------------------------------------------------------------------------
// rbac
// ---------------------------------------------------------------------------

#[test]
fn rbac_prints_cluster_role() {
    let output = controller().arg("rbac").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let role: serde_yaml::Value = serde_yaml::from_str(&stdout).unwrap();

    assert_eq!(role["kind"].as_str(), Some("ClusterRole"));
    assert_eq!(role["metadata"]["name"].as_str(), Some("cronjob-controller"));
    let rules = role["rules"].as_sequence().unwrap();
    assert_eq!(rules.len(), 5);
    assert!(stdout.contains("cronjobs/status"));
    assert!(stdout.contains("jobs/status"));
}

#[test]
fn rbac_custom_name() {
    controller()
        .args(["rbac", "--name", "batch-operator"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: batch-operator"));
}

#[test]
fn rbac_rejects_blank_name() {
    controller()
        .args(["rbac", "--name", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("role name must not be empty"));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_check_defaults_are_valid() {
    controller()
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_check_reports_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("controller.yaml");
    std::fs::write(&path, "request_timeout_secs: 0\n").unwrap();

    controller()
        .arg("--config")
        .arg(&path)
        .args(["config", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] request_timeout_secs"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_check_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    controller()
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("controller.yaml");

    controller()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    controller()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    controller()
        .env("CRONJOB_CONFIG", &path)
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"request_timeout_secs\": 30"));
}

#[test]
fn config_show_reads_namespace() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("controller.yaml");
    std::fs::write(&path, "namespace: batch\n").unwrap();

    controller()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch"));
}

// ---------------------------------------------------------------------------
// argument parsing
// ---------------------------------------------------------------------------

#[test]
fn reconcile_rejects_malformed_key() {
    controller()
        .args(["reconcile", "just-a-name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected <namespace>/<name>"));
}

#[test]
fn help_lists_commands() {
    controller()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("crd"))
        .stdout(predicate::str::contains("rbac"));
}
