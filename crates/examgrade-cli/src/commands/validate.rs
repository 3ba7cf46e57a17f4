//! The `examgrade validate` command.

use std::collections::HashMap;

use anyhow::Result;

use examgrade_core::validate::{
    duplicate_ids, validate_attempt, validate_exam, Severity, ValidationIssue,
};
use examgrade_store::config::{ExamgradeConfig, StoreConfig};
use examgrade_store::JsonDirStore;

pub async fn execute(config: &ExamgradeConfig) -> Result<()> {
    let StoreConfig::JsonDir { path } = &config.store else {
        anyhow::bail!("validate requires a json_dir store");
    };
    anyhow::ensure!(
        path.is_dir(),
        "store directory not found: {} (run `examgrade init` to create one)",
        path.display()
    );
    let store = JsonDirStore::new(path);

    let (exams, exam_failures) = store.scan_exams().await?;
    let (attempts, attempt_failures) = store.scan_attempts().await?;
    println!(
        "Checked {} exam(s) and {} attempt(s) in {}",
        exams.len() + exam_failures.len(),
        attempts.len() + attempt_failures.len(),
        store.root().display()
    );

    let mut issues: Vec<ValidationIssue> = Vec::new();
    let mut errors = 0usize;

    for failure in exam_failures.iter().chain(&attempt_failures) {
        println!("ERROR {}: {}", failure.path.display(), failure.error);
        errors += 1;
    }

    for id in duplicate_ids(exams.iter().map(|e| e.id.as_str())) {
        println!("ERROR exam {id}: id is used by more than one file");
        errors += 1;
    }
    for id in duplicate_ids(attempts.iter().map(|a| a.id.as_str())) {
        println!("ERROR attempt {id}: id is used by more than one file");
        errors += 1;
    }

    let by_id: HashMap<&str, _> = exams.iter().map(|e| (e.id.as_str(), e)).collect();
    for exam in &exams {
        issues.extend(validate_exam(exam));
    }
    for attempt in &attempts {
        issues.extend(validate_attempt(
            attempt,
            by_id.get(attempt.exam.as_str()).copied(),
        ));
    }

    for issue in &issues {
        let label = match issue.severity {
            Severity::Warning => "WARN ",
            Severity::Error => {
                errors += 1;
                "ERROR"
            }
        };
        println!("{label} {}: {}", issue.subject, issue.message);
    }

    if errors > 0 {
        anyhow::bail!("{errors} error(s) found");
    }
    println!("All documents valid.");
    Ok(())
}
