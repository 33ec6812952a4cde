//! Command-line behaviour against temporary files.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HDFC_STATEMENT: &str = "HDFC BANK Ltd\n\
    Statement of account\n\
    Date Narration Chq./Ref.No. Value Dt Withdrawal Amt. Deposit Amt. Closing Balance\n\
    01/02/24 STARBUCKS REF001 02/02/24 250.00 9750.00\n\
    02/02/24 IMPS-RAHUL 0000512345678901 02/02/24 500.00 10,250.00\n\
    STATEMENT SUMMARY :-\n\
    Opening Balance Dr Count Cr Count Debits Credits Closing Bal\n\
    10,000.00 1 1 250.00 500.00 10,250.00\n";

fn passbook() -> Command {
    Command::cargo_bin("passbook").unwrap()
}

/// A workspace with a default config file and an isolated data directory.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    passbook()
        .args(["--config", config.to_str().unwrap(), "config", "init"])
        .assert()
        .success();
    passbook()
        .args([
            "--config",
            config.to_str().unwrap(),
            "config",
            "set",
            "storage.data_dir",
            &format!("\"{}\"", dir.path().join("data").display()),
        ])
        .assert()
        .success();
    (dir, config)
}

fn write_statement(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, HDFC_STATEMENT).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    passbook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("categories"));
}

#[test]
fn test_process_text_statement_as_json() {
    let (dir, config) = workspace();
    let statement = write_statement(dir.path(), "feb.txt");

    let output = passbook()
        .args(["--config", config.to_str().unwrap(), "process"])
        .arg(&statement)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metadata"]["format"], "bank_account_statement");
    assert_eq!(json["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(json["transactions"][1]["type"], "Credit");
}

#[test]
fn test_process_csv_output() {
    let (dir, config) = workspace();
    let statement = write_statement(dir.path(), "feb.txt");

    passbook()
        .args(["--config", config.to_str().unwrap(), "process", "--format", "csv"])
        .arg(&statement)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("date,original_date"))
        .stdout(predicate::str::contains("2024-02-01"));
}

#[test]
fn test_process_missing_file_fails() {
    let (dir, config) = workspace();

    passbook()
        .args(["--config", config.to_str().unwrap(), "process"])
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    let statement = write_statement(dir.path(), "feb.txt");

    passbook()
        .args(["--config"])
        .arg(dir.path().join("nope.json"))
        .arg("process")
        .arg(&statement)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_get_and_set() {
    let (_dir, config) = workspace();
    let config = config.to_str().unwrap();

    passbook()
        .args(["--config", config, "config", "get", "extraction.min_block_len"])
        .assert()
        .success()
        .stdout("10\n");

    passbook()
        .args(["--config", config, "config", "set", "extraction.min_block_len", "12"])
        .assert()
        .success();

    passbook()
        .args(["--config", config, "config", "get", "extraction.min_block_len"])
        .assert()
        .success()
        .stdout("12\n");

    passbook()
        .args(["--config", config, "config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn test_config_init_refuses_overwrite() {
    let (_dir, config) = workspace();

    passbook()
        .args(["--config", config.to_str().unwrap(), "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_categories_add_assign_and_list() {
    let (_dir, config) = workspace();
    let config = config.to_str().unwrap();

    passbook()
        .args(["--config", config, "categories", "add", "Home Rent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("home_rent"));

    passbook()
        .args(["--config", config, "categories", "add", "home rent"])
        .assert()
        .failure();

    passbook()
        .args(["--config", config, "categories", "assign", "2024-02-01:250.00", "home_rent"])
        .assert()
        .success();

    passbook()
        .args(["--config", config, "categories", "assign", "2024-02-01:250.00", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid category"));

    passbook()
        .args(["--config", config, "categories", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Home Rent"))
        .stdout(predicate::str::contains("2024-02-01:250.00"));
}

#[test]
fn test_reconcile_collapses_duplicates_and_applies_override() {
    let (dir, config) = workspace();
    let config = config.to_str().unwrap();
    let statements = dir.path().join("statements");
    fs::create_dir_all(&statements).unwrap();
    write_statement(&statements, "feb-a.txt");
    write_statement(&statements, "feb-b.txt");
    fs::write(statements.join("blank.txt"), "   ").unwrap();

    passbook()
        .args(["--config", config, "categories", "assign", "2024-02-01:250.00", "foods"])
        .assert()
        .success();

    let pattern = statements.join("*.txt");
    let output = passbook()
        .args(["--config", config, "reconcile", "--jobs", "2"])
        .arg(pattern.to_str().unwrap())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let summary = &json["summary"];
    assert_eq!(summary["totalFiles"], 3);
    assert_eq!(summary["processedFiles"], 2);
    assert_eq!(summary["totalTransactions"], 4);
    assert_eq!(summary["duplicateGroups"], 2);
    assert_eq!(summary["collapsedTransactions"], 2);

    let starbucks = json["collapsedTransactions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["duplicateGroupKey"] == "2024-02-01:250.00")
        .unwrap();
    assert_eq!(starbucks["category"], "foods");
    assert_eq!(starbucks["categorySource"], "manual");
    assert_eq!(starbucks["duplicateCount"], 2);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("blank.txt"));
}

#[test]
fn test_reconcile_without_matches_fails() {
    let dir = TempDir::new().unwrap();

    passbook()
        .arg("reconcile")
        .arg(dir.path().join("*.pdf").to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}
