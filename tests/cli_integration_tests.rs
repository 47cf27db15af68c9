mod common;

use assert_cmd::Command;
use common::{full_first_half, happy_path};
use keystone_te::excel::layout;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn keystone_te() -> Command {
    Command::cargo_bin("keystone-te").unwrap()
}

#[test]
fn test_parse_prints_json() {
    let dir = TempDir::new().unwrap();
    let file = happy_path().write_to(dir.path(), "TE_2026_01.xlsx");

    keystone_te()
        .arg("parse")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"year\": 2026"))
        .stdout(predicate::str::contains("\"employee_name\": \"Ada Lovelace\""));
}

#[test]
fn test_parse_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let file = happy_path().write_to(dir.path(), "TE_2026_01.xlsx");
    let output = dir.path().join("te.json");

    keystone_te()
        .arg("parse")
        .arg(&file)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Workbook parsed"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["period"]["month"], serde_json::json!(1));
}

#[test]
fn test_validate_clean_workbook() {
    let dir = TempDir::new().unwrap();
    let file = full_first_half().write_to(dir.path(), "TE_2026_01.xlsx");

    keystone_te()
        .args(["validate", "--today", "2026-01-20"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("No blocking errors"));
}

#[test]
fn test_validate_missing_charge_code_fails() {
    let dir = TempDir::new().unwrap();
    let mut builder = full_first_half();
    builder.clear(layout::TIME_FIRST_HALF, "U6");
    let file = builder.write_to(dir.path(), "TE_2026_01.xlsx");

    keystone_te()
        .args(["validate", "--today", "2026-01-20"])
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("TIME_MISSING_CHARGE_CODE"))
        .stdout(predicate::str::contains("Time-1st half of month!U6"));
}

#[test]
fn test_validate_missing_file() {
    keystone_te()
        .args(["validate", "/nonexistent/TE.xlsx"])
        .assert()
        .failure();
}

#[test]
fn test_windows_gap_between_months() {
    keystone_te()
        .args(["windows", "--today", "2026-01-13"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No month is open for upload"));
}

#[test]
fn test_windows_lists_open_month() {
    keystone_te()
        .args(["windows", "--today", "2026-01-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-01"))
        .stdout(predicate::str::contains("closes 2026-01-25"));
}

fn write_manifest(dir: &TempDir) -> std::path::PathBuf {
    happy_path().write_to(dir.path(), "ada.xlsx");
    let manifest = dir.path().join("january.yaml");
    fs::write(
        &manifest,
        r#"
year: 2026
month: 1
employees:
  - id: 1
    first_name: Ada
    last_name: Lovelace
    employee_number: "1001"
    workbook: ada.xlsx
  - id: 2
    first_name: Cara
    last_name: Young
"#,
    )
    .unwrap();
    manifest
}

#[test]
fn test_report_payroll_to_xlsx() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir);
    let output = dir.path().join("payroll.xlsx");

    keystone_te()
        .args(["report", "payroll"])
        .arg(&manifest)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("payroll report 2026-01"));

    assert!(output.exists());
}

#[test]
fn test_report_category_to_stdout() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir);

    keystone_te()
        .args(["report", "category"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"category\""))
        .stdout(predicate::str::contains("Category 16th-end"));
}

#[test]
fn test_report_unknown_kind() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir);

    keystone_te()
        .args(["report", "weekly"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown report 'weekly'"));
}

#[test]
fn test_report_rejects_duplicate_employee_id() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("january.yaml");
    fs::write(
        &manifest,
        r#"
year: 2026
month: 1
employees:
  - id: 1
    first_name: Ada
    last_name: Lovelace
  - id: 1
    first_name: Alan
    last_name: Turing
"#,
    )
    .unwrap();

    keystone_te()
        .args(["report", "daily"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("employee id 1 is listed more than once"));
}
