//! Attempt finalizer and batch regrade orchestrator.
//!
//! The engine is the only place where grading has side effects: it loads the
//! attempt and exam, runs the pure aggregation and classification, and writes
//! the whole attempt back in one save.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::aggregate::{aggregate, AnswerAnomaly};
use crate::error::GradingError;
use crate::grade::{classify, percentage};
use crate::model::{Attempt, AttemptStatus, Exam, Grade, GradingThresholds};
use crate::report::{AttemptOutcome, RegradeFailure, RegradeReport};
use crate::settings::ResolvedSettings;
use crate::statistics::summarize;
use crate::traits::{AttemptStore, ExamStore};

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingEngineConfig {
    /// Maximum attempts graded concurrently during a regrade.
    pub parallelism: usize,
    /// Thresholds used when an exam defines none.
    pub default_grading: GradingThresholds,
}

impl Default for GradingEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            default_grading: GradingThresholds::default(),
        }
    }
}

/// Progress reporting for batch regrades.
pub trait ProgressReporter: Send + Sync {
    fn on_attempt_graded(&self, outcome: &AttemptOutcome);
    fn on_attempt_error(&self, attempt_id: &str, error: &GradingError);
    fn on_regrade_complete(&self, total: usize, graded: usize, failed: usize);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_attempt_graded(&self, _: &AttemptOutcome) {}
    fn on_attempt_error(&self, _: &str, _: &GradingError) {}
    fn on_regrade_complete(&self, _: usize, _: usize, _: usize) {}
}

/// An attempt graded in memory but not yet persisted.
#[derive(Debug, Clone)]
pub struct GradedAttempt {
    /// The attempt with every derived field filled in.
    pub attempt: Attempt,
    /// Percentage used for classification.
    pub percentage: f64,
    /// Answers that scored zero because they could not be evaluated.
    pub anomalies: Vec<AnswerAnomaly>,
}

/// Grade an attempt against its exam without touching any store.
pub fn grade_attempt(
    attempt: &Attempt,
    exam: &Exam,
    default_grading: &GradingThresholds,
) -> GradedAttempt {
    let settings = ResolvedSettings::resolve(exam, default_grading);
    let card = aggregate(&attempt.answers, &settings);
    let pct = percentage(card.total, exam.total_marks);
    let grade = classify(pct, &settings.grading);

    GradedAttempt {
        attempt: Attempt {
            answers: card.answers,
            total_marks_obtained: card.total,
            status: AttemptStatus::Evaluated,
            grade: Some(grade),
            evaluated_at: Some(chrono::Utc::now()),
            ..attempt.clone()
        },
        percentage: pct,
        anomalies: card.anomalies,
    }
}

/// The grading engine.
pub struct GradingEngine {
    attempts: Arc<dyn AttemptStore>,
    exams: Arc<dyn ExamStore>,
    config: GradingEngineConfig,
}

impl GradingEngine {
    pub fn new(
        attempts: Arc<dyn AttemptStore>,
        exams: Arc<dyn ExamStore>,
        config: GradingEngineConfig,
    ) -> Self {
        Self {
            attempts,
            exams,
            config,
        }
    }

    pub fn config(&self) -> &GradingEngineConfig {
        &self.config
    }

    /// Evaluate an attempt, persist it, and return the updated attempt.
    pub async fn evaluate_attempt(&self, attempt_id: &str) -> Result<Attempt, GradingError> {
        self.evaluate_attempt_with_cancel(attempt_id, &CancellationToken::new())
            .await
    }

    /// Like [`evaluate_attempt`](Self::evaluate_attempt), but gives up before
    /// the write if `cancel` has been triggered.
    pub async fn evaluate_attempt_with_cancel(
        &self,
        attempt_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Attempt, GradingError> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await
            .map_err(GradingError::Store)?
            .ok_or_else(|| GradingError::AttemptNotFound(attempt_id.to_string()))?;

        let exam = self
            .exams
            .find_by_id(&attempt.exam)
            .await
            .map_err(GradingError::Store)?
            .ok_or_else(|| GradingError::ExamNotFound {
                attempt_id: attempt.id.clone(),
                exam_id: attempt.exam.clone(),
            })?;

        let graded = finalize(
            self.attempts.as_ref(),
            &attempt,
            &exam,
            &self.config.default_grading,
            cancel,
        )
        .await?;
        Ok(graded.attempt)
    }

    /// Re-grade every submitted or evaluated attempt of an exam.
    ///
    /// Attempts are graded concurrently up to the configured parallelism.
    /// A failure on one attempt is recorded in the report and does not stop
    /// the others.
    pub async fn regrade_exam(
        &self,
        exam_id: &str,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<RegradeReport, GradingError> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        let exam = self
            .exams
            .find_by_id(exam_id)
            .await
            .map_err(GradingError::Store)?
            .ok_or_else(|| GradingError::UnknownExam(exam_id.to_string()))?;
        let exam = Arc::new(exam);

        if cancel.is_cancelled() {
            return Err(GradingError::Cancelled);
        }

        let listing = self
            .attempts
            .list_by_exam(exam_id)
            .await
            .map_err(GradingError::Store)?;

        let (pending, skipped): (Vec<Attempt>, Vec<Attempt>) = listing
            .attempts
            .into_iter()
            .partition(|a| a.status != AttemptStatus::InProgress);
        if !skipped.is_empty() {
            tracing::info!(
                exam = exam_id,
                "skipping {} in-progress attempt(s)",
                skipped.len()
            );
        }

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for attempt in pending {
            let store = Arc::clone(&self.attempts);
            let exam = Arc::clone(&exam);
            let semaphore = Arc::clone(&semaphore);
            let default_grading = self.config.default_grading;
            let cancel = cancel.clone();

            futures.push(async move {
                let attempt_id = attempt.id.clone();
                let previous_total = attempt.total_marks_obtained;
                let previous_grade = attempt.grade;
                let inner = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| GradingError::Store(anyhow::anyhow!("semaphore closed")))?;
                    finalize(store.as_ref(), &attempt, &exam, &default_grading, &cancel).await
                };
                let result = inner.await.map(|graded| AttemptOutcome {
                    attempt_id: attempt_id.clone(),
                    student: graded.attempt.student.clone(),
                    previous_total,
                    previous_grade,
                    total: graded.attempt.total_marks_obtained,
                    percentage: graded.percentage,
                    grade: graded.attempt.grade.unwrap_or(Grade::F),
                    anomalies: graded.anomalies,
                });
                (attempt_id, result)
            });
        }

        let total = futures.len() + listing.unreadable.len();
        let mut outcomes = Vec::new();
        let mut failures = Vec::new();

        for unreadable in listing.unreadable {
            let e = GradingError::UnreadableAttempt {
                attempt_id: unreadable.attempt_id.clone(),
                reason: unreadable.reason,
            };
            tracing::error!("regrade failed for {}: {e}", unreadable.attempt_id);
            progress.on_attempt_error(&unreadable.attempt_id, &e);
            failures.push(RegradeFailure {
                attempt_id: unreadable.attempt_id,
                error: e.to_string(),
            });
        }

        while let Some((attempt_id, result)) = futures.next().await {
            match result {
                Ok(outcome) => {
                    progress.on_attempt_graded(&outcome);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    tracing::error!("regrade failed for {attempt_id}: {e}");
                    progress.on_attempt_error(&attempt_id, &e);
                    failures.push(RegradeFailure {
                        attempt_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        progress.on_regrade_complete(total, outcomes.len(), failures.len());
        outcomes.sort_by(|a, b| a.attempt_id.cmp(&b.attempt_id));
        failures.sort_by(|a, b| a.attempt_id.cmp(&b.attempt_id));

        let evaluated = self
            .attempts
            .list_by_exam(exam_id)
            .await
            .map_err(GradingError::Store)?;
        let summary = summarize(&exam, &evaluated.attempts);

        Ok(RegradeReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            exam_id: exam.id.clone(),
            exam_title: exam.title.clone(),
            skipped_in_progress: skipped.len(),
            outcomes,
            failures,
            summary,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Grade and persist one attempt. The write happens last, after the
/// cancellation check, and replaces the whole document.
async fn finalize(
    store: &dyn AttemptStore,
    attempt: &Attempt,
    exam: &Exam,
    default_grading: &GradingThresholds,
    cancel: &CancellationToken,
) -> Result<GradedAttempt, GradingError> {
    let graded = grade_attempt(attempt, exam, default_grading);

    if cancel.is_cancelled() {
        tracing::info!(attempt = %attempt.id, "evaluation cancelled, nothing written");
        return Err(GradingError::Cancelled);
    }

    store
        .save(&graded.attempt)
        .await
        .map_err(GradingError::Store)?;

    tracing::info!(
        attempt = %attempt.id,
        exam = %exam.id,
        total = graded.attempt.total_marks_obtained,
        percentage = graded.percentage,
        grade = %graded.attempt.grade.unwrap_or(Grade::F),
        anomalies = graded.anomalies.len(),
        "attempt evaluated"
    );
    Ok(graded)
}
