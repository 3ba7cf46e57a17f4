//! Regrade report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::AnswerAnomaly;
use crate::model::Grade;
use crate::statistics::ExamSummary;

/// The result of re-grading all attempts of one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegradeReport {
    /// Unique run identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub exam_id: String,
    pub exam_title: String,
    /// Attempts left alone because they were still in progress.
    pub skipped_in_progress: usize,
    /// Successfully re-graded attempts, sorted by attempt id.
    pub outcomes: Vec<AttemptOutcome>,
    /// Attempts that could not be re-graded.
    pub failures: Vec<RegradeFailure>,
    /// Statistics over the exam's evaluated attempts after the run.
    pub summary: ExamSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Before/after for one re-graded attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub attempt_id: String,
    #[serde(default)]
    pub student: Option<String>,
    pub previous_total: f64,
    pub previous_grade: Option<Grade>,
    pub total: f64,
    pub percentage: f64,
    pub grade: Grade,
    #[serde(default)]
    pub anomalies: Vec<AnswerAnomaly>,
}

impl AttemptOutcome {
    /// Returns `true` if the total or grade differs from before the run.
    pub fn changed(&self) -> bool {
        self.previous_grade != Some(self.grade) || (self.previous_total - self.total).abs() > 1e-9
    }
}

/// An attempt that failed to re-grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegradeFailure {
    pub attempt_id: String,
    pub error: String,
}

impl RegradeReport {
    /// Number of attempts whose total or grade changed.
    pub fn changed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.changed()).count()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: RegradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
