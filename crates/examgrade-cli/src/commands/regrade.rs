//! The `examgrade regrade` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use tokio_util::sync::CancellationToken;

use examgrade_core::engine::ProgressReporter;
use examgrade_core::error::GradingError;
use examgrade_core::report::{AttemptOutcome, RegradeReport};
use examgrade_store::config::ExamgradeConfig;

use super::open_engine;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_attempt_graded(&self, outcome: &AttemptOutcome) {
        let marker = if outcome.changed() { " (changed)" } else { "" };
        eprintln!(
            "  Graded: {} {} -> {} [{}]{marker}",
            outcome.attempt_id, outcome.previous_total, outcome.total, outcome.grade
        );
    }

    fn on_attempt_error(&self, attempt_id: &str, error: &GradingError) {
        eprintln!("  ERROR: {attempt_id}: {error}");
    }

    fn on_regrade_complete(&self, total: usize, graded: usize, failed: usize) {
        eprintln!("\nComplete: {graded}/{total} graded, {failed} failed");
    }
}

pub async fn execute(
    config: &ExamgradeConfig,
    exam_id: &str,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(p) = parallelism {
        anyhow::ensure!(p >= 1, "parallelism must be at least 1");
        config.parallelism = p;
    }
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let (_stores, engine) = open_engine(&config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, finishing in-flight attempts...");
                cancel.cancel();
            }
        })
    };

    eprintln!(
        "Regrading exam {exam_id} (parallelism {})",
        engine.config().parallelism
    );
    let result = engine.regrade_exam(exam_id, &ConsoleReporter, &cancel).await;
    ctrl_c.abort();
    let report = result?;

    let timestamp = report.created_at.format("%Y%m%d-%H%M%S");
    let path = output.join(format!("regrade-{exam_id}-{timestamp}.json"));
    report.save_json(&path)?;

    print_report(&report);
    println!("\nReport written to {}", path.display());

    if cancel.is_cancelled() {
        anyhow::bail!("regrade interrupted; report is partial");
    }
    Ok(())
}

fn print_report(report: &RegradeReport) {
    let mut table = Table::new();
    table.set_header(vec!["Attempt", "Student", "Before", "After", "%", "Grade"]);

    for o in &report.outcomes {
        let before = match o.previous_grade {
            Some(g) => format!("{} ({g})", o.previous_total),
            None => o.previous_total.to_string(),
        };
        table.add_row(vec![
            Cell::new(&o.attempt_id),
            Cell::new(o.student.as_deref().unwrap_or("-")),
            Cell::new(before),
            Cell::new(o.total),
            Cell::new(format!("{:.1}", o.percentage)),
            Cell::new(o.grade),
        ]);
    }
    println!("{table}");

    for f in &report.failures {
        println!("FAILED {}: {}", f.attempt_id, f.error);
    }

    println!(
        "\n{}: {} graded, {} changed, {} failed, {} in progress skipped ({}ms)",
        report.exam_title,
        report.outcomes.len(),
        report.changed_count(),
        report.failures.len(),
        report.skipped_in_progress,
        report.duration_ms,
    );
}
