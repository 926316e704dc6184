//! CLI integration tests for the `fleetlog` binary.
//!
//! Uses `assert_cmd` to spawn the binary against a reminder file in a
//! temporary directory and verify exit codes, output, and the file contents
//! left behind.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Reference time used by every `--at` in this file.
const NOW: &str = "2025-06-01T12:00:00Z";

/// Helper: create a Command for the `fleetlog` binary with a clean
/// environment so that a developer's FLEETLOG_* settings don't leak in.
fn fleetlog() -> Command {
    let mut cmd = cargo_bin_cmd!("fleetlog");
    cmd.env_remove("FLEETLOG_DATA")
        .env_remove("FLEETLOG_PORT")
        .env_remove("FLEETLOG_CONCURRENCY")
        .env_remove("FLEETLOG_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn write_reminders(dir: &Path, reminders: serde_json::Value) -> PathBuf {
    let path = dir.join("reminders.json");
    fs::write(&path, serde_json::to_string_pretty(&reminders).unwrap()).unwrap();
    path
}

fn read_statuses(path: &Path) -> Vec<Option<String>> {
    let text = fs::read_to_string(path).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
    records
        .iter()
        .map(|r| r.get("status").and_then(|s| s.as_str()).map(String::from))
        .collect()
}

/// Yesterday, tomorrow, and exactly now relative to `NOW`.
fn three_reminders() -> serde_json::Value {
    serde_json::json!([
        { "id": "r1", "license_plate": "ABC123", "title": "Oil", "reminder_type": "Oil",
          "due_date": "2025-05-31T12:00:00Z" },
        { "id": "r2", "license_plate": "XYZ789", "title": "Service", "reminder_type": "Service",
          "due_date": "2025-06-02T12:00:00Z" },
        { "id": "r3", "license_plate": "DEF456", "title": "Tires", "reminder_type": "Tires",
          "due_date": "2025-06-01T12:00:00Z" },
    ])
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    fleetlog()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fleet maintenance reminder tooling"));
}

#[test]
fn version_exits_0() {
    fleetlog()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetlog"));
}

// ──────────────────────────────────────────────
// 2. reconcile
// ──────────────────────────────────────────────

#[test]
fn reconcile_updates_all_three_then_none() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(dir.path(), three_reminders());

    fleetlog()
        .args(["reconcile", "--at", NOW, "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 reminder(s) updated."));

    assert_eq!(
        read_statuses(&data),
        vec![
            Some("due".to_string()),
            Some("not due".to_string()),
            Some("due".to_string())
        ]
    );

    fleetlog()
        .args(["reconcile", "--at", NOW, "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 reminder(s) updated."));
}

#[test]
fn reconcile_overwrites_completed_past_due() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(
        dir.path(),
        serde_json::json!([
            { "id": "r1", "license_plate": "ABC123", "title": "Oil",
              "due_date": "2025-05-31T12:00:00Z", "status": "completed" },
            { "id": "r2", "license_plate": "XYZ789", "title": "Service",
              "due_date": "2025-06-02T12:00:00Z", "status": "not due" },
        ]),
    );

    fleetlog()
        .args(["reconcile", "--at", NOW, "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 reminder(s) updated."));

    assert_eq!(
        read_statuses(&data),
        vec![Some("due".to_string()), Some("not due".to_string())]
    );
}

#[test]
fn reconcile_missing_file_is_empty_store() {
    let dir = TempDir::new().unwrap();
    fleetlog()
        .args(["reconcile", "--at", NOW, "--data"])
        .arg(dir.path().join("absent.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0 reminder(s) updated."));
}

#[test]
fn reconcile_json_output() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(dir.path(), three_reminders());

    let output = fleetlog()
        .args(["--output", "json", "reconcile", "--at", NOW, "--data"])
        .arg(&data)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["updatedCount"], 3);
    assert_eq!(json["scanned"], 3);
    assert_eq!(json["referenceTime"], NOW);
    assert_eq!(json["failures"], serde_json::json!([]));
}

#[test]
fn reconcile_with_prefilter_and_concurrency() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(dir.path(), three_reminders());

    fleetlog()
        .args(["reconcile", "--at", NOW, "--prefilter", "--concurrency", "4", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 reminder(s) updated."));
}

#[test]
fn reconcile_corrupt_file_exits_1() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("reminders.json");
    fs::write(&data, "[{ not json").unwrap();

    fleetlog()
        .args(["reconcile", "--at", NOW, "--data"])
        .arg(&data)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error opening"));
}

#[test]
fn reconcile_failed_writes_exit_2() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(dir.path(), three_reminders());
    // A directory where the temp file goes makes every status write fail.
    fs::create_dir(dir.path().join("reminders.json.tmp")).unwrap();

    fleetlog()
        .args(["reconcile", "--at", NOW, "--data"])
        .arg(&data)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("0 reminder(s) updated."))
        .stderr(predicate::str::contains("failed to update reminder r1"));

    assert_eq!(read_statuses(&data), vec![None, None, None]);
}

#[test]
fn reconcile_failed_writes_listed_in_json() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(dir.path(), three_reminders());
    fs::create_dir(dir.path().join("reminders.json.tmp")).unwrap();

    let output = fleetlog()
        .args(["--output", "json", "reconcile", "--at", NOW, "--data"])
        .arg(&data)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["updatedCount"], 0);
    let failed: Vec<&str> = json["failures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(failed, ["r1", "r2", "r3"]);
}

#[test]
fn reconcile_rejects_bad_reference_time() {
    fleetlog()
        .args(["reconcile", "--at", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}

#[test]
fn reconcile_reads_data_path_from_env() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(dir.path(), three_reminders());

    fleetlog()
        .env("FLEETLOG_DATA", &data)
        .args(["reconcile", "--at", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 reminder(s) updated."));
}

#[test]
fn reconcile_reads_config_file() {
    let dir = TempDir::new().unwrap();
    let data = write_reminders(dir.path(), three_reminders());
    let config = dir.path().join("fleetlog.toml");
    fs::write(
        &config,
        format!(
            "data = {:?}\n\n[reconcile]\nconcurrency = 2\n",
            data.display().to_string()
        ),
    )
    .unwrap();

    fleetlog()
        .arg("--config")
        .arg(&config)
        .args(["reconcile", "--at", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 reminder(s) updated."));
}

#[test]
fn bad_config_file_exits_1() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("fleetlog.toml");
    fs::write(&config, "port = \"not a number\"\n").unwrap();

    fleetlog()
        .arg("--config")
        .arg(&config)
        .args(["reconcile", "--at", NOW])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error parsing config"));
}
