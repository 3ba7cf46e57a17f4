//! The `examgrade init` command.

use std::path::Path;

use anyhow::{Context, Result};

use examgrade_core::model::{Attempt, Exam};
use examgrade_core::traits::{AttemptStore, ExamStore};
use examgrade_store::config::{ExamgradeConfig, StoreConfig};
use examgrade_store::JsonDirStore;

pub async fn execute(config: &ExamgradeConfig) -> Result<()> {
    if Path::new("examgrade.toml").exists() {
        println!("examgrade.toml already exists, skipping.");
    } else {
        std::fs::write("examgrade.toml", sample_config(config)?)?;
        println!("Created examgrade.toml");
    }

    let StoreConfig::JsonDir { path } = &config.store else {
        anyhow::bail!("init requires a json_dir store");
    };
    let store = JsonDirStore::new(path);
    store.init()?;
    println!("Store ready at {}", path.display());

    let exam: Exam = serde_json::from_str(SAMPLE_EXAM).context("bad sample exam")?;
    if ExamStore::find_by_id(&store, &exam.id).await?.is_some() {
        println!("Exam {} already exists, skipping.", exam.id);
    } else {
        store.put_exam(&exam).await?;
        println!("Created exam {}", exam.id);
    }

    let attempt: Attempt = serde_json::from_str(SAMPLE_ATTEMPT).context("bad sample attempt")?;
    if AttemptStore::find_by_id(&store, &attempt.id).await?.is_some() {
        println!("Attempt {} already exists, skipping.", attempt.id);
    } else {
        store.save(&attempt).await?;
        println!("Created attempt {}", attempt.id);
    }

    println!("\nNext steps:");
    println!("  1. Run: examgrade validate");
    println!("  2. Run: examgrade evaluate --attempt sample-attempt");
    println!("  3. Run: examgrade regrade --exam sample-exam");

    Ok(())
}

fn sample_config(config: &ExamgradeConfig) -> Result<String> {
    let StoreConfig::JsonDir { path } = &config.store else {
        anyhow::bail!("init requires a json_dir store");
    };
    Ok(SAMPLE_CONFIG.replace("{store}", &format!("{:?}", path.display().to_string())))
}

const SAMPLE_CONFIG: &str = r#"# examgrade configuration

parallelism = 4
output_dir = "./examgrade-reports"
# log_filter = "examgrade=debug"

[store]
type = "json_dir"
path = {store}

# Used for exams that define no grading thresholds.
[default_grading]
A = 85
B = 70
C = 50
D = 35
"#;

const SAMPLE_EXAM: &str = r#"{
  "id": "sample-exam",
  "title": "Sample Exam",
  "totalMarks": 10,
  "settings": {
    "negativeMarking": -1,
    "allowPartialScoring": true,
    "grading": { "A": 85, "B": 70, "C": 50, "D": 35 }
  }
}"#;

const SAMPLE_ATTEMPT: &str = r#"{
  "id": "sample-attempt",
  "exam": "sample-exam",
  "student": "sample-student",
  "status": "submitted",
  "answers": [
    {
      "snapshot": { "questionType": "mcq_single", "correctAnswers": ["b"], "marks": 2 },
      "answer": ["b"]
    },
    {
      "snapshot": { "questionType": "mcq_multi", "correctAnswers": ["a", "c"], "marks": 4 },
      "answer": ["a"]
    },
    {
      "snapshot": { "questionType": "true_false", "correctAnswers": ["true"], "marks": 1 },
      "answer": ["True"]
    },
    {
      "snapshot": { "questionType": "fill_blank", "correctAnswers": ["Paris"], "marks": 1 },
      "answer": [" paris "]
    },
    {
      "snapshot": {
        "questionType": "match",
        "correctAnswers": [{ "key": "H2O", "value": "water" }, { "key": "NaCl", "value": "salt" }],
        "marks": 2
      },
      "answer": [{ "key": "NaCl", "value": "salt" }, { "key": "H2O", "value": "water" }]
    }
  ]
}"#;
