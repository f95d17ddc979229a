//! Integration tests for the glyco binary.
//!
//! These tests verify end-to-end behavior including:
//! - Recording, listing, updating and deleting readings
//! - Owner scoping and identity resolution
//! - Spreadsheet import/export and the printable report
//! - Aggregation commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI isolated from the user's real config and environment
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("glyco"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .env_remove("GLYCO_USER")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn add(dir: &Path, user: &str, date: &str, time: &str, value: &str, condition: &str) {
    cli(dir)
        .args(["--user", user, "add"])
        .args(["--date", date, "--time", time, "--value", value, "--age", "35"])
        .args(["--condition", condition])
        .assert()
        .success();
}

/// Ids of every stored reading, in file order
fn stored_ids(dir: &Path) -> Vec<String> {
    let contents = fs::read_to_string(dir.join("data/readings.jsonl")).unwrap_or_default();
    contents
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|v| v["id"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("glyco"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal blood glucose journal"));
}

#[test]
fn test_add_and_list() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["--user", "ana", "add"])
        .args(["--date", "2024-03-01", "--time", "07:30", "--value", "250", "--age", "35"])
        .args(["--source", "drink", "--condition", "fasting", "--note", "orange juice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reading stored"))
        .stdout(predicate::str::contains("High"));

    assert!(dir.join("data/readings.jsonl").exists());

    cli(dir)
        .args(["--user", "ana", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-01 07:30"))
        .stdout(predicate::str::contains("Drink"))
        .stdout(predicate::str::contains("orange juice"));
}

#[test]
fn test_invalid_value_is_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["--user", "ana", "add"])
        .args(["--date", "2024-03-01", "--time", "07:30", "--value", "abc", "--age", "35"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("value: not a number"));

    cli(dir)
        .args(["--user", "ana", "add"])
        .args(["--date", "2024-03-01", "--time", "07:30", "--value", "-5", "--age", "35"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("value: out of range"));

    cli(dir)
        .args(["--user", "ana", "add"])
        .args(["--date", "2024-03-01", "--time", "07:30", "--value", "90", "--age", "35"])
        .args(["--condition", "after-lunch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("condition: unrecognized enum value"));

    assert!(stored_ids(dir).is_empty());
}

#[test]
fn test_missing_identity_is_unauthorized() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized"));

    cli(dir)
        .args(["--user", "   ", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized"));
}

#[test]
fn test_identity_from_env_and_config() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .env("GLYCO_USER", "ana")
        .args(["add", "--date", "2024-03-01", "--time", "07:30", "--value", "90", "--age", "35"])
        .assert()
        .success();

    let config_dir = dir.join("config/glyco");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[owner]\ndefault_user = \"ana\"\n").unwrap();

    cli(dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-01"));
}

#[test]
fn test_readings_are_scoped_to_owner() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add(dir, "ana", "2024-03-01", "07:30", "90", "fasting");
    let id = stored_ids(dir).remove(0);

    cli(dir)
        .args(["--user", "bob", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No readings found"));

    cli(dir)
        .args(["--user", "bob", "update", &id])
        .args(["--date", "2024-03-01", "--time", "08:00", "--value", "1", "--age", "35"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Reading not found"));

    cli(dir)
        .args(["--user", "bob", "delete", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Reading not found"));

    cli(dir)
        .args(["--user", "ana", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("90"));
}

#[test]
fn test_update_and_delete() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add(dir, "ana", "2024-03-01", "07:30", "90", "fasting");
    let id = stored_ids(dir).remove(0);

    cli(dir)
        .args(["--user", "ana", "update", &id])
        .args(["--date", "2024-03-02", "--time", "21:15", "--value", "60", "--age", "4"])
        .args(["--condition", "before-sleep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reading updated"))
        .stdout(predicate::str::contains("Low"));

    assert_eq!(stored_ids(dir), vec![id.clone()]);

    cli(dir)
        .args(["--user", "ana", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reading deleted"));

    assert!(stored_ids(dir).is_empty());

    cli(dir)
        .args(["--user", "ana", "delete", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Reading not found"));
}

#[test]
fn test_malformed_id_is_not_found() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["--user", "ana", "delete", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Reading not found"));
}

#[test]
fn test_list_filters() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["--user", "ana", "add"])
        .args(["--date", "2024-03-01", "--time", "07:30", "--value", "95", "--age", "35"])
        .args(["--condition", "fasting", "--note", "Green tea"])
        .assert()
        .success();
    cli(dir)
        .args(["--user", "ana", "add"])
        .args(["--date", "2024-03-01", "--time", "13:00", "--value", "142", "--age", "35"])
        .args(["--condition", "after-meal", "--note", "rice"])
        .assert()
        .success();

    cli(dir)
        .args(["--user", "ana", "list", "--search", "TEA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Green tea"))
        .stdout(predicate::str::contains("rice").not());

    cli(dir)
        .args(["--user", "ana", "list", "--condition", "after-meal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rice"))
        .stdout(predicate::str::contains("Green tea").not());

    cli(dir)
        .args(["--user", "ana", "list", "--source", "snack"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("source: unrecognized enum value"));
}

#[test]
fn test_best_effort_import_reports_failures() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let csv_path = dir.join("import.csv");
    fs::write(
        &csv_path,
        "Date,Time,Blood Sugar,Age,Type,Condition,Description\n\
         2024-01-05,08:00,110 mg/dL,30,Food,After-lunch,bad\n\
         2024-01-05,09:00,95,30,Food,Fasting,good\n",
    )
    .unwrap();

    cli(dir)
        .args(["--user", "ana", "import"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 of 2 rows"))
        .stdout(predicate::str::contains("row 1: condition: unrecognized enum value"))
        .stdout(predicate::str::contains("Total readings: 1"));

    assert_eq!(stored_ids(dir).len(), 1);
}

#[test]
fn test_atomic_import_stores_nothing() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let csv_path = dir.join("import.csv");
    fs::write(
        &csv_path,
        "Date,Time,Blood Sugar,Age,Type,Condition,Description\n\
         2024-01-05,08:00,110,30,Food,Fasting,\n\
         2024-01-05,09:00,,30,Food,Fasting,\n",
    )
    .unwrap();

    cli(dir)
        .args(["--user", "ana", "import", "--atomic"])
        .arg(&csv_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import rejected"))
        .stderr(predicate::str::contains("row 2: value"));

    assert!(stored_ids(dir).is_empty());
}

#[test]
fn test_import_missing_file_fails() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["--user", "ana", "import"])
        .arg(dir.join("nope.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_export_import_round_trip() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add(dir, "ana", "2024-03-01", "07:30", "90", "fasting");
    add(dir, "ana", "2024-03-01", "19:45", "165", "after-meal");

    let export_path = dir.join("export.csv");
    cli(dir)
        .args(["--user", "ana", "export", "--output"])
        .arg(&export_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 readings"));

    let exported = fs::read_to_string(&export_path).unwrap();
    assert!(exported.starts_with("Date,Time,Blood Sugar,Status,Age,Type,Condition,Description"));
    assert!(exported.contains("165 mg/dL"));
    assert!(exported.contains("Post-meal"));

    cli(dir)
        .args(["--user", "bob", "import"])
        .arg(&export_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 of 2 rows"));

    cli(dir)
        .args(["--user", "bob", "list", "--condition", "after-meal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("19:45"));
}

#[test]
fn test_export_to_stdout() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["--user", "ana", "export"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Date,Time,Blood Sugar,Status,Age,Type,Condition,Description",
        ));
}

#[test]
fn test_report_paginates() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let config_dir = dir.join("config/glyco");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[document]\nrows_per_page = 2\n").unwrap();

    for time in ["07:00", "12:00", "18:30"] {
        add(dir, "ana", "2024-03-01", time, "100", "normal");
    }

    let report_path = dir.join("report.txt");
    cli(dir)
        .args(["--user", "ana", "report", "--output"])
        .arg(&report_path)
        .assert()
        .success();

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("Blood Sugar History"));
    assert!(report.contains("Page 1 of 2"));
    assert!(report.contains("Page 2 of 2"));
    assert_eq!(report.matches('\u{c}').count(), 1);
}

#[test]
fn test_report_without_readings() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["--user", "ana", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 1 of 1"))
        .stdout(predicate::str::contains("(no readings)"));
}

#[test]
fn test_aggregation_commands() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add(dir, "ana", "2024-03-02", "07:30", "90", "fasting");
    add(dir, "ana", "2024-03-01", "08:00", "110", "fasting");
    add(dir, "ana", "2024-03-01", "13:00", "141", "after-meal");

    cli(dir)
        .args(["--user", "ana", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"2024-03-01\s+2\s+126\s+110\s+141").unwrap());

    cli(dir)
        .args(["--user", "ana", "trends"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Morning (04:00-10:00)"))
        .stdout(predicate::str::contains("Midday (10:00-15:00)"))
        .stdout(predicate::str::contains("Evening").not());

    cli(dir)
        .args(["--user", "ana", "conditions"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Fasting\s+2").unwrap())
        .stdout(predicate::str::is_match(r"Post-meal\s+1").unwrap());

    cli(dir)
        .args(["--user", "ana", "sources", "--sort"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"2024-03-01\s+food\s+2\s+drink\s+0\n2024-03-02").unwrap());
}

#[test]
fn test_aggregation_without_readings() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    for command in ["summary", "trends", "conditions", "sources"] {
        cli(dir)
            .args(["--user", "ana", command])
            .assert()
            .success()
            .stdout(predicate::str::contains("No readings yet"));
    }
}

#[test]
fn test_classify_needs_no_identity() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["classify", "95", "--age", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Low"));

    cli(dir)
        .args(["classify", "131", "--age", "35"])
        .assert()
        .success()
        .stdout(predicate::str::contains("High"));

    cli(dir)
        .args(["classify", "131"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Undetermined"));
}

#[test]
fn test_classify_rejects_non_finite_value() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    for value in ["NaN", "inf", "-inf"] {
        cli(dir)
            .args(["classify", value, "--age", "30"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("value: not a number"));
    }

    cli(dir)
        .args(["classify", "-5", "--age", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("value: out of range"));
}

#[test]
fn test_best_effort_flag_overrides_atomic_config() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let config_dir = dir.join("config/glyco");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[import]\nmode = \"atomic\"\n").unwrap();

    let csv_path = dir.join("import.csv");
    fs::write(
        &csv_path,
        "Date,Time,Blood Sugar,Age,Type,Condition,Description\n\
         2024-01-05,08:00,110,30,Food,Fasting,\n\
         2024-01-05,09:00,oops,30,Food,Fasting,\n",
    )
    .unwrap();

    cli(dir)
        .args(["--user", "ana", "import"])
        .arg(&csv_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import rejected"));
    assert!(stored_ids(dir).is_empty());

    cli(dir)
        .args(["--user", "ana", "import", "--best-effort"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 of 2 rows"));
    assert_eq!(stored_ids(dir).len(), 1);

    cli(dir)
        .args(["--user", "ana", "import", "--best-effort", "--atomic"])
        .arg(&csv_path)
        .assert()
        .failure();
}

#[test]
fn test_import_row_with_invalid_utf8() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let mut bytes = b"Date,Time,Blood Sugar,Age,Type,Condition,Description\n".to_vec();
    bytes.extend_from_slice(b"2024-01-05,09:00,95,30,Food,Fasting,good\n");
    bytes.extend_from_slice(b"2024-01-05,10:00,\xff\xfe,30,Food,Fasting,bad\n");
    let csv_path = dir.join("import.csv");
    fs::write(&csv_path, bytes).unwrap();

    cli(dir)
        .args(["--user", "ana", "import"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 of 2 rows"))
        .stdout(predicate::str::contains("row 2: value: not a number"));

    assert_eq!(stored_ids(dir).len(), 1);
}

#[test]
fn test_report_keeps_long_description() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let note = "Pancakes with maple syrup and a large glass of chocolate milk at the fair";
    cli(dir)
        .args(["--user", "ana", "add"])
        .args(["--date", "2024-03-01", "--time", "09:00", "--value", "180", "--age", "35"])
        .args(["--note", note])
        .assert()
        .success();

    let output = cli(dir)
        .args(["--user", "ana", "report"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = String::from_utf8(output.stdout).unwrap();
    for word in note.split(' ') {
        assert!(report.contains(word), "missing {:?} in report", word);
    }
    assert!(!report.contains('…'));
}
