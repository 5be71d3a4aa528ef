//! End-to-end tests for the ebill binary.
//!
//! Every test here stays offline: commands either stop before any
//! service call (argument and credential validation) or never make one
//! (config and evaluate work on local files only).

use assert_cmd::Command;
use predicates::prelude::*;

fn ebill() -> Command {
    let mut cmd = Command::cargo_bin("ebill").unwrap();
    // Keep the runner's real credentials out of the subprocess.
    cmd.env_remove("OPENAI_API_KEY");
    cmd.env_remove("GOOGLE_VISION_API_KEY");
    cmd
}

/// Credentials that pass validation without being called.
fn with_dummy_keys(cmd: &mut Command) -> &mut Command {
    cmd.env("OPENAI_API_KEY", "sk-test")
        .env("GOOGLE_VISION_API_KEY", "vision-test")
}

#[test]
fn help_lists_subcommands() {
    ebill()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Process a single bill file"))
        .stdout(predicate::str::contains("Evaluate saved extractions"));
}

#[test]
fn process_requires_credentials() {
    ebill()
        .args(["process", "some-bill.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn process_reports_missing_input() {
    let mut cmd = ebill();
    with_dummy_keys(&mut cmd)
        .args(["process", "/nonexistent/bill.pdf", "--stdout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn batch_reports_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = ebill();
    with_dummy_keys(&mut cmd)
        .args(["batch", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no matching files found"));
}

#[test]
fn config_path_prints_location() {
    ebill()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"));
}

#[test]
fn config_show_honors_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"services": {"openai_model": "gpt-4o"}}"#).unwrap();

    ebill()
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"openai_model\": \"gpt-4o\""));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let path_arg = path.to_str().unwrap();

    ebill()
        .args(["config", "init", "--output", path_arg])
        .assert()
        .success();
    assert!(path.exists());

    ebill()
        .args(["config", "init", "--output", path_arg])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    ebill()
        .args(["config", "init", "--output", path_arg, "--force"])
        .assert()
        .success();
}

#[test]
fn config_validate_names_every_missing_key() {
    ebill()
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("OPENAI_API_KEY is not set"))
        .stdout(predicate::str::contains("GOOGLE_VISION_API_KEY is not set"));
}

#[test]
fn evaluate_compares_saved_extractions() {
    let dir = tempfile::tempdir().unwrap();
    let gt_path = dir.path().join("ground_truth.json");
    std::fs::write(
        &gt_path,
        r#"[
            {
                "file_name": "bill-a.pdf",
                "invoiceNumber": "725500210425",
                "meterReadings": [{"meterNumber": "RJ04953956", "unitsConsumed": 176}]
            },
            {
                "file_name": "bill-b.pdf",
                "invoiceNumber": "111122223333",
                "meterReadings": []
            }
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("bill-a_extracted.json"),
        r#"{
            "invoice_number": "725500210425",
            "meter_number": "RJ04953956",
            "units_consumed": "176"
        }"#,
    )
    .unwrap();

    ebill()
        .args([
            "evaluate",
            "--results-dir",
            dir.path().to_str().unwrap(),
            "--ground-truth",
            gt_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Evaluated: bill-a.pdf"))
        .stdout(predicate::str::contains("accuracy 100.00%"))
        .stdout(predicate::str::contains("No extraction found for: bill-b.pdf"))
        .stdout(predicate::str::contains("AVERAGE ACCURACY: 100.00%"));

    let report = std::fs::read_to_string(dir.path().join("evaluation_report.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["status"], "evaluated");
    assert_eq!(entries[1]["status"], "no_extraction");
    assert!(dir.path().join("evaluation_report.txt").exists());
}
