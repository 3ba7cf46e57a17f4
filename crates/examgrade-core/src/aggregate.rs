//! Score aggregation over an attempt's answers.

use serde::{Deserialize, Serialize};

use crate::error::AnswerError;
use crate::evaluate::{evaluate_answer, Evaluation};
use crate::model::Answer;
use crate::settings::ResolvedSettings;

/// Result of grading every answer of an attempt.
#[derive(Debug, Clone)]
pub struct Scorecard {
    /// Evaluated copies of the input answers, in the same order.
    pub answers: Vec<Answer>,
    /// Sum of `marks_obtained` over all answers.
    pub total: f64,
    /// Answers that could not be graded normally.
    pub anomalies: Vec<AnswerAnomaly>,
}

/// An answer that scored zero because it could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerAnomaly {
    /// Position of the answer in the attempt.
    pub index: usize,
    /// What went wrong.
    pub reason: String,
}

/// Grade all answers. Never fails: a malformed answer scores zero and is
/// reported in [`Scorecard::anomalies`].
pub fn aggregate(answers: &[Answer], settings: &ResolvedSettings) -> Scorecard {
    let mut evaluated = Vec::with_capacity(answers.len());
    let mut anomalies = Vec::new();
    let mut total = 0.0;

    for (index, answer) in answers.iter().enumerate() {
        let eval = match evaluate_answer(&answer.snapshot, &answer.answer, settings) {
            Ok(eval) => eval,
            Err(e) => {
                flag(index, answer, &e);
                anomalies.push(AnswerAnomaly {
                    index,
                    reason: e.to_string(),
                });
                Evaluation::ZERO
            }
        };

        tracing::debug!(
            index,
            question_type = %answer.snapshot.question_type,
            is_correct = eval.is_correct,
            marks = eval.marks_awarded,
            "evaluated answer"
        );

        total += eval.marks_awarded;
        evaluated.push(Answer {
            is_correct: eval.is_correct,
            marks_obtained: eval.marks_awarded,
            ..answer.clone()
        });
    }

    Scorecard {
        answers: evaluated,
        total,
        anomalies,
    }
}

fn flag(index: usize, answer: &Answer, error: &AnswerError) {
    tracing::warn!(
        index,
        question = answer.question.as_deref().unwrap_or("-"),
        "answer scored zero: {error}"
    );
}
