//! Static checks on stored exams and attempts.
//!
//! Grading never fails on these conditions; they are reported so operators
//! can fix data before learners see a lower-than-expected score.

use std::collections::HashSet;

use crate::evaluate::Question;
use crate::model::{Attempt, Exam};

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Grading proceeds but the result may surprise.
    Warning,
    /// At least one answer will score zero regardless of what was given.
    Error,
}

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Document the issue belongs to, e.g. "exam e1" or "attempt a1 answer 3".
    pub subject: String,
    pub message: String,
}

impl ValidationIssue {
    fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }

    fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Check an exam's settings.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationIssue> {
    let subject = format!("exam {}", exam.id);
    let mut issues = Vec::new();

    if !exam.total_marks.is_finite() || exam.total_marks <= 0.0 {
        issues.push(ValidationIssue::warning(
            &subject,
            format!(
                "totalMarks is {}; every attempt will be graded at 0%",
                exam.total_marks
            ),
        ));
    }

    if let Some(settings) = &exam.settings {
        if let Some(grading) = &settings.grading {
            if !grading.is_descending() {
                issues.push(ValidationIssue::warning(
                    &subject,
                    format!(
                        "grading thresholds are not descending (A={}, B={}, C={}, D={})",
                        grading.a, grading.b, grading.c, grading.d
                    ),
                ));
            }
        }
        if let Some(nm) = settings.negative_marking {
            if nm > 0.0 {
                issues.push(ValidationIssue::warning(
                    &subject,
                    format!("negativeMarking is positive ({nm}); incorrect answers will earn marks"),
                ));
            }
        }
    }

    issues
}

/// Check an attempt against the set of known exams.
pub fn validate_attempt(attempt: &Attempt, exam: Option<&Exam>) -> Vec<ValidationIssue> {
    let subject = format!("attempt {}", attempt.id);
    let mut issues = Vec::new();

    if exam.is_none() {
        issues.push(ValidationIssue::error(
            &subject,
            format!("references missing exam {}", attempt.exam),
        ));
    }

    let mut max_marks = 0.0;
    for (index, answer) in attempt.answers.iter().enumerate() {
        match Question::from_snapshot(&answer.snapshot) {
            Ok(question) => max_marks += question.marks(),
            Err(e) => issues.push(ValidationIssue::error(
                format!("{subject} answer {index}"),
                e.to_string(),
            )),
        }
    }

    if let Some(exam) = exam {
        if exam.total_marks.is_finite()
            && exam.total_marks > 0.0
            && (max_marks - exam.total_marks).abs() > 1e-9
            && !attempt.answers.is_empty()
        {
            issues.push(ValidationIssue::warning(
                &subject,
                format!(
                    "snapshot marks sum to {max_marks} but exam totalMarks is {}",
                    exam.total_marks
                ),
            ));
        }
    }

    issues
}

/// Report attempt ids that appear more than once.
pub fn duplicate_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for id in ids {
        if !seen.insert(id) {
            dupes.push(id.to_string());
        }
    }
    dupes
}
