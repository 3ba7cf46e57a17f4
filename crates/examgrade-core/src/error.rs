//! Grading error types.
//!
//! `GradingError` aborts a whole evaluation; `AnswerError` is local to one
//! answer and never stops the rest of the attempt from being graded.

use thiserror::Error;

/// Errors that abort the evaluation of an attempt.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The attempt id does not resolve.
    #[error("attempt not found: {0}")]
    AttemptNotFound(String),

    /// The attempt's exam reference does not resolve.
    #[error("exam {exam_id} not found (referenced by attempt {attempt_id})")]
    ExamNotFound { attempt_id: String, exam_id: String },

    /// An exam requested directly by id does not exist.
    #[error("exam not found: {0}")]
    UnknownExam(String),

    /// The stored attempt exists but its document could not be loaded.
    #[error("attempt {attempt_id} could not be read: {reason}")]
    UnreadableAttempt { attempt_id: String, reason: String },

    /// The caller cancelled before results were written.
    #[error("evaluation cancelled before write")]
    Cancelled,

    /// The backing store failed.
    #[error("store error: {0:#}")]
    Store(#[source] anyhow::Error),
}

impl GradingError {
    /// Message safe to show to an end user.
    pub fn user_message(&self) -> &'static str {
        "could not grade attempt"
    }

    /// Returns `true` if the error is caused by data that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GradingError::AttemptNotFound(_)
                | GradingError::ExamNotFound { .. }
                | GradingError::UnknownExam(_)
        )
    }
}

/// A problem with a single answer. The answer scores zero and is flagged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnswerError {
    /// No evaluator exists for this question type.
    #[error("unsupported question type: {0}")]
    UnsupportedQuestionType(String),

    /// The answer or answer key has the wrong shape for the question type.
    #[error("{field} has the wrong shape for a {question_type} question")]
    AnswerShape {
        question_type: String,
        field: &'static str,
    },

    /// The snapshot carries no correct answers.
    #[error("answer key is empty")]
    EmptyAnswerKey,

    /// The snapshot's marks value is negative or not a number.
    #[error("invalid marks value: {0}")]
    InvalidMarks(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(GradingError::AttemptNotFound("a".into()).is_not_found());
        assert!(GradingError::ExamNotFound {
            attempt_id: "a".into(),
            exam_id: "e".into()
        }
        .is_not_found());
        assert!(!GradingError::Cancelled.is_not_found());
    }

    #[test]
    fn user_message_is_generic() {
        let err = GradingError::Store(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.user_message(), "could not grade attempt");
        assert!(err.to_string().contains("disk on fire"));
    }
}
