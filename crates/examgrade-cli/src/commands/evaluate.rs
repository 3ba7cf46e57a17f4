//! The `examgrade evaluate` command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examgrade_core::grade::percentage;
use examgrade_core::model::{AnswerValue, Attempt};
use examgrade_store::config::ExamgradeConfig;

use super::open_engine;

pub async fn execute(config: &ExamgradeConfig, attempt_id: &str, json: bool) -> Result<()> {
    let (stores, engine) = open_engine(config)?;

    let attempt = match engine.evaluate_attempt(attempt_id).await {
        Ok(a) => a,
        Err(e) => {
            let message = e.user_message();
            return Err(anyhow::Error::new(e).context(message));
        }
    };

    if json {
        let out = serde_json::to_string_pretty(&attempt).context("failed to serialize attempt")?;
        println!("{out}");
        return Ok(());
    }

    let total_marks = stores
        .exams
        .find_by_id(&attempt.exam)
        .await?
        .map(|e| e.total_marks)
        .unwrap_or(0.0);
    print_attempt(&attempt, total_marks);
    Ok(())
}

fn print_attempt(attempt: &Attempt, total_marks: f64) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Answer", "Correct", "Marks"]);

    for (i, answer) in attempt.answers.iter().enumerate() {
        let max = answer.snapshot.marks.unwrap_or(1.0);
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&answer.snapshot.question_type),
            Cell::new(display_answer(&answer.answer)),
            Cell::new(if answer.is_correct { "yes" } else { "no" }),
            Cell::new(format!("{} / {}", answer.marks_obtained, max)),
        ]);
    }

    println!("{table}");
    println!(
        "Attempt {}: {} / {} ({:.1}%)  Grade {}",
        attempt.id,
        attempt.total_marks_obtained,
        total_marks,
        percentage(attempt.total_marks_obtained, total_marks),
        attempt
            .grade
            .map(|g| g.to_string())
            .unwrap_or_else(|| "-".into()),
    );
}

fn display_answer(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Choices(c) if c.is_empty() => "(blank)".into(),
        AnswerValue::Choices(c) => c.join(", "),
        AnswerValue::Pairs(p) => p
            .iter()
            .map(|pair| format!("{}→{}", pair.key, pair.value))
            .collect::<Vec<_>>()
            .join(", "),
        AnswerValue::Malformed(v) => format!("(unreadable: {v})"),
    }
}
