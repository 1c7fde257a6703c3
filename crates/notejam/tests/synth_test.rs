use assert_cmd::Command;
use predicates::prelude::*;

fn notejam() -> Command {
    let mut cmd = Command::cargo_bin("notejam").unwrap();
    cmd.env_remove("NOTEJAM_ENVIRONMENT_TYPE")
        .env_remove("NOTEJAM_FEATURE_ID")
        .env_remove("NOTEJAM_PROFILE");
    cmd
}

#[test]
fn test_synth_requires_environment_type() {
    notejam()
        .arg("synth")
        .assert()
        .failure()
        .stderr(predicate::str::contains("environment-type"));
}

#[test]
fn test_synth_rejects_unknown_environment_type() {
    notejam()
        .arg("synth")
        .args(["--environment-type", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown environment type"));
}

#[test]
fn test_synth_emits_deployment_graph() {
    let output = notejam()
        .arg("synth")
        .args(["--environment-type", "dev"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let graph: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(graph["commons"]["stack_name"], "NoteJamCommons");
    assert_eq!(graph["network"]["stack_name"], "NoteJamNetwork");
    assert_eq!(graph["network"]["topology"]["vpc_cidr"], "10.0.0.0/16");
    assert_eq!(graph["data_layer"]["db"]["database_name"], "notejam");
    assert_eq!(graph["monitoring"]["db_cpu_alarm"]["threshold"], 70.0);
}

#[test]
fn test_synth_feature_environment_prefixes_names() {
    let output = notejam()
        .arg("synth")
        .args(["--environment-type", "dev", "--feature-id", "pr123"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let graph: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(graph["commons"]["stack_name"], "pr123-NoteJamCommons");
    assert_eq!(graph["app_layer"]["stack_name"], "pr123-NoteJamAppLayer");
}

#[test]
fn test_synth_environment_type_from_env_var() {
    notejam()
        .arg("synth")
        .env("NOTEJAM_ENVIRONMENT_TYPE", "dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("NoteJamNetwork"));
}

#[test]
fn test_synth_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");

    notejam()
        .arg("synth")
        .args(["--environment-type", "dev"])
        .arg("--output")
        .arg(&path)
        .assert()
        .success();

    let graph: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(graph["data_layer"]["stack_name"], "NoteJamDataLayer");
}

#[test]
fn test_synth_is_deterministic() {
    let run = || {
        notejam()
            .arg("synth")
            .args(["--environment-type", "dev", "--feature-id", "pr7"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(), run());
}
