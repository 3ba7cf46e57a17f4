//! The `examgrade summary` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use examgrade_core::statistics::{summarize, ExamSummary};
use examgrade_store::config::ExamgradeConfig;

use super::open_stores;

pub async fn execute(config: &ExamgradeConfig, exam_id: &str) -> Result<()> {
    let stores = open_stores(config)?;

    let exam = stores
        .exams
        .find_by_id(exam_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("exam not found: {exam_id}"))?;
    let listing = stores.attempts.list_by_exam(exam_id).await?;

    let summary = summarize(&exam, &listing.attempts);
    println!("{} ({})", exam.title, exam.id);
    print_summary(&summary);
    for u in &listing.unreadable {
        println!("Unreadable attempt {} not counted: {}", u.attempt_id, u.reason);
    }
    Ok(())
}

fn print_summary(summary: &ExamSummary) {
    if summary.attempt_count == 0 {
        println!("No evaluated attempts.");
        return;
    }

    println!(
        "{} evaluated, mean {:.2} ({:.1}%), highest {}, lowest {}",
        summary.attempt_count,
        summary.mean_total,
        summary.mean_percentage,
        summary.highest_total,
        summary.lowest_total,
    );

    let mut grades = Table::new();
    grades.set_header(vec!["Grade", "Count"]);
    for gc in &summary.grade_distribution {
        grades.add_row(vec![Cell::new(gc.grade), Cell::new(gc.count)]);
    }
    println!("{grades}");

    let mut questions = Table::new();
    questions.set_header(vec!["#", "Type", "Answered", "Correct %", "Mean marks"]);
    for q in &summary.per_question {
        questions.add_row(vec![
            Cell::new(q.index + 1),
            Cell::new(&q.question_type),
            Cell::new(q.answered),
            Cell::new(format!("{:.1}", q.correct_rate * 100.0)),
            Cell::new(format!("{:.2}", q.mean_marks)),
        ]);
    }
    println!("{questions}");
}
