//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn examgrade(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("examgrade").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("EXAMGRADE_STORE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// A temp dir with `examgrade init` already run in it.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    examgrade(dir.path()).arg("init").assert().success();
    dir
}

#[test]
fn init_creates_config_and_samples() {
    let dir = TempDir::new().unwrap();
    examgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created examgrade.toml"))
        .stdout(predicate::str::contains("Created exam sample-exam"))
        .stdout(predicate::str::contains("Created attempt sample-attempt"));

    assert!(dir.path().join("examgrade.toml").exists());
    assert!(dir
        .path()
        .join("examgrade-data/exams/sample-exam.json")
        .exists());
    assert!(dir
        .path()
        .join("examgrade-data/attempts/sample-attempt.json")
        .exists());
}

#[test]
fn init_is_idempotent() {
    let dir = initialized();
    examgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("examgrade.toml already exists"))
        .stdout(predicate::str::contains("Exam sample-exam already exists"));
}

#[test]
fn validate_sample_store() {
    let dir = initialized();
    examgrade(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 exam(s) and 1 attempt(s)"))
        .stdout(predicate::str::contains("All documents valid."));
}

#[test]
fn validate_reports_corrupt_and_broken_documents() {
    let dir = initialized();
    let attempts = dir.path().join("examgrade-data/attempts");
    std::fs::write(attempts.join("corrupt.json"), "{ not json").unwrap();
    std::fs::write(
        attempts.join("orphan.json"),
        r#"{"id":"orphan","exam":"no-such-exam","status":"submitted","answers":[
            {"snapshot":{"questionType":"essay","correctAnswers":["x"]},"answer":["x"]}
        ]}"#,
    )
    .unwrap();

    examgrade(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("corrupt.json"))
        .stdout(predicate::str::contains("references missing exam no-such-exam"))
        .stdout(predicate::str::contains("attempt orphan answer 0"))
        .stderr(predicate::str::contains("3 error(s) found"));
}

#[test]
fn evaluate_sample_attempt() {
    let dir = initialized();
    examgrade(dir.path())
        .args(["evaluate", "--attempt", "sample-attempt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8 / 10 (80.0%)"))
        .stdout(predicate::str::contains("Grade B"));

    let saved: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(
            dir.path()
                .join("examgrade-data/attempts/sample-attempt.json"),
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(saved["status"], "evaluated");
    assert_eq!(saved["grade"], "B");
    assert_eq!(saved["totalMarksObtained"].as_f64(), Some(8.0));
    assert_eq!(saved["answers"][1]["marksObtained"].as_f64(), Some(2.0));
    assert_eq!(saved["answers"][1]["isCorrect"], false);
}

#[test]
fn evaluate_json_output() {
    let dir = initialized();
    let output = examgrade(dir.path())
        .args(["evaluate", "--attempt", "sample-attempt", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let attempt: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(attempt["id"], "sample-attempt");
    assert_eq!(attempt["grade"], "B");
    assert!(attempt["evaluatedAt"].is_string());
}

#[test]
fn evaluate_missing_attempt_fails() {
    let dir = initialized();
    examgrade(dir.path())
        .args(["evaluate", "--attempt", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not grade attempt"));
}

#[test]
fn evaluate_without_store_suggests_init() {
    let dir = TempDir::new().unwrap();
    examgrade(dir.path())
        .args(["evaluate", "--attempt", "sample-attempt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("examgrade init"));
}

#[test]
fn store_flag_overrides_config() {
    let dir = initialized();
    let other = TempDir::new().unwrap();
    examgrade(dir.path())
        .arg("--store")
        .arg(other.path().join("missing"))
        .args(["evaluate", "--attempt", "sample-attempt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("store directory not found"));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    examgrade(dir.path())
        .args(["--config", "nowhere.toml", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn regrade_writes_report() {
    let dir = initialized();
    examgrade(dir.path())
        .args(["regrade", "--exam", "sample-exam", "--parallelism", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 graded, 1 changed, 0 failed"))
        .stdout(predicate::str::contains("Report written to"));

    let reports: Vec<_> = std::fs::read_dir(dir.path().join("examgrade-reports"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].starts_with("regrade-sample-exam-"));
    assert!(reports[0].ends_with(".json"));
}

#[test]
fn regrade_unknown_exam_fails() {
    let dir = initialized();
    let out = dir.path().join("out");
    examgrade(dir.path())
        .args(["regrade", "--exam", "missing-exam", "--output"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing-exam"));
    assert!(!out.exists());
}

#[test]
fn summary_before_and_after_evaluation() {
    let dir = initialized();
    examgrade(dir.path())
        .args(["summary", "--exam", "sample-exam"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No evaluated attempts."));

    examgrade(dir.path())
        .args(["evaluate", "--attempt", "sample-attempt"])
        .assert()
        .success();

    examgrade(dir.path())
        .args(["summary", "--exam", "sample-exam"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 evaluated, mean 8.00 (80.0%)"))
        .stdout(predicate::str::contains("mcq_multi"));
}

#[test]
fn memory_store_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("examgrade.toml"), "[store]\ntype = \"memory\"\n").unwrap();
    for args in [
        &["evaluate", "--attempt", "a1"][..],
        &["regrade", "--exam", "e1"][..],
        &["summary", "--exam", "e1"][..],
    ] {
        examgrade(dir.path())
            .args(args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("memory store"));
    }
}

#[test]
fn regrade_lists_unreadable_attempts_as_failed() {
    let dir = initialized();
    std::fs::write(
        dir.path().join("examgrade-data/attempts/broken.json"),
        r#"{"id": "broken", "exam": "sample-exam", "answers": 7}"#,
    )
    .unwrap();

    examgrade(dir.path())
        .args(["regrade", "--exam", "sample-exam"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FAILED broken"))
        .stdout(predicate::str::contains("1 graded, 1 changed, 1 failed"))
        .stderr(predicate::str::contains("Complete: 1/2 graded, 1 failed"));
}
