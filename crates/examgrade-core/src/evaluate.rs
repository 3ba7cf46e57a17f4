//! Per-question answer evaluators.
//!
//! A snapshot is first turned into a typed [`Question`], which fixes the
//! answer-key shape for its kind. Dispatch is then an exhaustive match, so a
//! new question kind cannot be added without an evaluator.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::AnswerError;
use crate::model::{AnswerValue, MatchPair, QuestionSnapshot, QuestionType};
use crate::settings::ResolvedSettings;

/// Outcome of evaluating one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Whether the answer is fully correct.
    pub is_correct: bool,
    /// Marks awarded, already clamped into `[0, marks]`.
    pub marks_awarded: f64,
}

impl Evaluation {
    /// Zero marks, not correct.
    pub const ZERO: Evaluation = Evaluation {
        is_correct: false,
        marks_awarded: 0.0,
    };
}

/// A question with its answer key in the shape its kind requires.
#[derive(Debug, Clone, PartialEq)]
pub enum Question<'a> {
    McqSingle { correct: &'a [String], marks: f64 },
    McqMulti { correct: &'a [String], marks: f64 },
    TrueFalse { correct: &'a [String], marks: f64 },
    FillBlank { correct: &'a [String], marks: f64 },
    Match { correct: &'a [MatchPair], marks: f64 },
}

impl<'a> Question<'a> {
    /// Build a typed question from a snapshot.
    pub fn from_snapshot(snapshot: &'a QuestionSnapshot) -> Result<Self, AnswerError> {
        let kind: QuestionType = snapshot
            .question_type
            .parse()
            .map_err(|_| AnswerError::UnsupportedQuestionType(snapshot.question_type.clone()))?;

        let marks = match snapshot.marks {
            None => 1.0,
            Some(m) if m.is_finite() && m >= 0.0 => m,
            Some(m) => return Err(AnswerError::InvalidMarks(m)),
        };

        let key = &snapshot.correct_answers;
        if key.is_empty() {
            return Err(AnswerError::EmptyAnswerKey);
        }

        let question = match kind {
            QuestionType::McqSingle => Question::McqSingle {
                correct: choices(key, kind, "correctAnswers")?,
                marks,
            },
            QuestionType::McqMulti => Question::McqMulti {
                correct: choices(key, kind, "correctAnswers")?,
                marks,
            },
            QuestionType::TrueFalse => Question::TrueFalse {
                correct: choices(key, kind, "correctAnswers")?,
                marks,
            },
            QuestionType::FillBlank => Question::FillBlank {
                correct: choices(key, kind, "correctAnswers")?,
                marks,
            },
            QuestionType::Match => Question::Match {
                correct: pairs(key, kind, "correctAnswers")?,
                marks,
            },
        };
        Ok(question)
    }

    pub fn kind(&self) -> QuestionType {
        match self {
            Question::McqSingle { .. } => QuestionType::McqSingle,
            Question::McqMulti { .. } => QuestionType::McqMulti,
            Question::TrueFalse { .. } => QuestionType::TrueFalse,
            Question::FillBlank { .. } => QuestionType::FillBlank,
            Question::Match { .. } => QuestionType::Match,
        }
    }

    /// Maximum marks for this question.
    pub fn marks(&self) -> f64 {
        match self {
            Question::McqSingle { marks, .. }
            | Question::McqMulti { marks, .. }
            | Question::TrueFalse { marks, .. }
            | Question::FillBlank { marks, .. }
            | Question::Match { marks, .. } => *marks,
        }
    }

    /// Evaluate a given answer. The awarded marks are clamped into `[0, marks]`.
    pub fn evaluate(
        &self,
        given: &AnswerValue,
        settings: &ResolvedSettings,
    ) -> Result<Evaluation, AnswerError> {
        let kind = self.kind();
        let (is_correct, raw) = match self {
            Question::McqSingle { correct, marks } => {
                mcq_single(choices(given, kind, "answer")?, correct, *marks, settings)
            }
            Question::McqMulti { correct, marks } => {
                mcq_multi(choices(given, kind, "answer")?, correct, *marks, settings)
            }
            Question::TrueFalse { correct, marks } => {
                true_false(choices(given, kind, "answer")?, correct, *marks, settings)
            }
            Question::FillBlank { correct, marks } => {
                fill_blank(choices(given, kind, "answer")?, correct, *marks)
            }
            Question::Match { correct, marks } => {
                match_pairs(pairs(given, kind, "answer")?, correct, *marks, settings)
            }
        };

        Ok(Evaluation {
            is_correct,
            marks_awarded: raw.clamp(0.0, self.marks()),
        })
    }
}

/// Evaluate an answer against its snapshot.
pub fn evaluate_answer(
    snapshot: &QuestionSnapshot,
    given: &AnswerValue,
    settings: &ResolvedSettings,
) -> Result<Evaluation, AnswerError> {
    Question::from_snapshot(snapshot)?.evaluate(given, settings)
}

fn choices<'v>(
    value: &'v AnswerValue,
    kind: QuestionType,
    field: &'static str,
) -> Result<&'v [String], AnswerError> {
    value.as_choices().ok_or_else(|| AnswerError::AnswerShape {
        question_type: kind.to_string(),
        field,
    })
}

fn pairs<'v>(
    value: &'v AnswerValue,
    kind: QuestionType,
    field: &'static str,
) -> Result<&'v [MatchPair], AnswerError> {
    value.as_pairs().ok_or_else(|| AnswerError::AnswerShape {
        question_type: kind.to_string(),
        field,
    })
}

fn award(is_correct: bool, marks: f64, settings: &ResolvedSettings) -> (bool, f64) {
    if is_correct {
        (true, marks)
    } else {
        (false, settings.negative_marking)
    }
}

fn mcq_single(
    given: &[String],
    correct: &[String],
    marks: f64,
    settings: &ResolvedSettings,
) -> (bool, f64) {
    let is_correct = given.len() == 1 && correct.contains(&given[0]);
    award(is_correct, marks, settings)
}

fn mcq_multi(
    given: &[String],
    correct: &[String],
    marks: f64,
    settings: &ResolvedSettings,
) -> (bool, f64) {
    let given_set: HashSet<&str> = given.iter().map(String::as_str).collect();
    let correct_set: HashSet<&str> = correct.iter().map(String::as_str).collect();
    let exact = given_set == correct_set;

    if settings.allow_partial_scoring {
        let hits = given_set.intersection(&correct_set).count();
        let awarded = marks * hits as f64 / correct_set.len() as f64;
        return (exact, awarded);
    }

    award(exact && given.len() == correct.len(), marks, settings)
}

fn true_false(
    given: &[String],
    correct: &[String],
    marks: f64,
    settings: &ResolvedSettings,
) -> (bool, f64) {
    let is_correct = match (given, correct.first()) {
        ([only], Some(expected)) => only.to_lowercase() == expected.to_lowercase(),
        _ => false,
    };
    award(is_correct, marks, settings)
}

fn fill_blank(given: &[String], correct: &[String], marks: f64) -> (bool, f64) {
    let is_correct = given.first().is_some_and(|g| {
        let g = normalize_blank(g);
        correct.iter().any(|c| normalize_blank(c) == g)
    });
    // No negative marking for blanks.
    if is_correct {
        (true, marks)
    } else {
        (false, 0.0)
    }
}

fn normalize_blank(s: &str) -> String {
    s.trim().to_lowercase()
}

fn match_pairs(
    given: &[MatchPair],
    correct: &[MatchPair],
    marks: f64,
    settings: &ResolvedSettings,
) -> (bool, f64) {
    if settings.allow_partial_scoring {
        let given_set: HashSet<&MatchPair> = given.iter().collect();
        let hits = given_set.iter().filter(|p| correct.contains(p)).count();
        let awarded = marks * hits as f64 / correct.len() as f64;
        return (hits == correct.len(), awarded);
    }

    let is_correct = given.len() == correct.len() && correct.iter().all(|p| given.contains(p));
    award(is_correct, marks, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(question_type: &str, key: AnswerValue, marks: Option<f64>) -> QuestionSnapshot {
        QuestionSnapshot {
            question_type: question_type.into(),
            correct_answers: key,
            marks,
        }
    }

    fn strs(items: &[&str]) -> AnswerValue {
        AnswerValue::Choices(items.iter().map(|s| s.to_string()).collect())
    }

    fn pairs_of(items: &[(&str, &str)]) -> AnswerValue {
        AnswerValue::Pairs(items.iter().map(|(k, v)| MatchPair::new(*k, *v)).collect())
    }

    fn strict(negative_marking: f64) -> ResolvedSettings {
        ResolvedSettings {
            negative_marking,
            ..Default::default()
        }
    }

    fn partial() -> ResolvedSettings {
        ResolvedSettings {
            negative_marking: -2.0,
            allow_partial_scoring: true,
            ..Default::default()
        }
    }

    // --- mcq_single ---

    #[test]
    fn mcq_single_correct_awards_marks() {
        let s = snap("mcq_single", strs(&["b"]), Some(4.0));
        let eval = evaluate_answer(&s, &strs(&["b"]), &strict(0.0)).unwrap();
        assert_eq!(
            eval,
            Evaluation {
                is_correct: true,
                marks_awarded: 4.0
            }
        );
    }

    #[test]
    fn mcq_single_wrong_with_negative_marking_clamps_to_zero() {
        let s = snap("mcq_single", strs(&["b"]), Some(4.0));
        let eval = evaluate_answer(&s, &strs(&["a"]), &strict(-1.0)).unwrap();
        assert_eq!(eval, Evaluation::ZERO);
    }

    #[test]
    fn mcq_single_wrong_with_positive_setting_awards_it_up_to_marks() {
        let s = snap("mcq_single", strs(&["b"]), Some(4.0));
        let eval = evaluate_answer(&s, &strs(&["a"]), &strict(1.5)).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.marks_awarded, 1.5);

        let capped = evaluate_answer(&s, &strs(&["a"]), &strict(10.0)).unwrap();
        assert_eq!(capped.marks_awarded, 4.0);
    }

    #[test]
    fn mcq_single_rejects_multiple_selections() {
        let s = snap("mcq_single", strs(&["a", "b"]), None);
        let eval = evaluate_answer(&s, &strs(&["a", "b"]), &strict(0.0)).unwrap();
        assert!(!eval.is_correct);
    }

    #[test]
    fn mcq_single_accepts_any_listed_answer() {
        let s = snap("mcq_single", strs(&["a", "c"]), None);
        let eval = evaluate_answer(&s, &strs(&["c"]), &strict(0.0)).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.marks_awarded, 1.0, "marks default to 1");
    }

    #[test]
    fn mcq_single_is_case_sensitive() {
        let s = snap("mcq_single", strs(&["B"]), None);
        let eval = evaluate_answer(&s, &strs(&["b"]), &strict(0.0)).unwrap();
        assert!(!eval.is_correct);
    }

    // --- mcq_multi ---

    #[test]
    fn mcq_multi_strict_requires_exact_set() {
        let s = snap("mcq_multi", strs(&["a", "b"]), Some(3.0));
        let exact = evaluate_answer(&s, &strs(&["b", "a"]), &strict(0.0)).unwrap();
        assert!(exact.is_correct);
        assert_eq!(exact.marks_awarded, 3.0);

        let subset = evaluate_answer(&s, &strs(&["a"]), &strict(-1.0)).unwrap();
        assert_eq!(subset, Evaluation::ZERO);

        let superset = evaluate_answer(&s, &strs(&["a", "b", "c"]), &strict(0.0)).unwrap();
        assert!(!superset.is_correct);
    }

    #[test]
    fn mcq_multi_strict_rejects_duplicate_padding() {
        let s = snap("mcq_multi", strs(&["a", "b"]), None);
        let eval = evaluate_answer(&s, &strs(&["a", "a", "b"]), &strict(0.0)).unwrap();
        assert!(!eval.is_correct);
    }

    #[test]
    fn mcq_multi_partial_two_of_four() {
        let s = snap("mcq_multi", strs(&["a", "b", "c", "d"]), Some(10.0));
        let eval = evaluate_answer(&s, &strs(&["a", "b"]), &partial()).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.marks_awarded, 5.0);
    }

    #[test]
    fn mcq_multi_partial_full_match_is_correct() {
        let s = snap("mcq_multi", strs(&["a", "b"]), Some(10.0));
        let eval = evaluate_answer(&s, &strs(&["a", "b"]), &partial()).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.marks_awarded, 10.0);
    }

    #[test]
    fn mcq_multi_partial_ignores_wrong_choices_and_negative_marking() {
        let s = snap("mcq_multi", strs(&["a", "b"]), Some(10.0));
        let eval = evaluate_answer(&s, &strs(&["a", "x", "y"]), &partial()).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.marks_awarded, 5.0);

        let none = evaluate_answer(&s, &strs(&["x"]), &partial()).unwrap();
        assert_eq!(none, Evaluation::ZERO);
    }

    #[test]
    fn mcq_multi_partial_counts_duplicates_once() {
        let s = snap("mcq_multi", strs(&["a", "b"]), Some(10.0));
        let eval = evaluate_answer(&s, &strs(&["a", "a", "a"]), &partial()).unwrap();
        assert_eq!(eval.marks_awarded, 5.0);
    }

    // --- true_false ---

    #[test]
    fn true_false_is_case_insensitive() {
        let s = snap("true_false", strs(&["True"]), Some(2.0));
        let eval = evaluate_answer(&s, &strs(&["true"]), &strict(0.0)).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.marks_awarded, 2.0);
    }

    #[test]
    fn true_false_wrong_and_empty() {
        let s = snap("true_false", strs(&["true"]), Some(2.0));
        assert!(!evaluate_answer(&s, &strs(&["false"]), &strict(-1.0))
            .unwrap()
            .is_correct);
        assert_eq!(
            evaluate_answer(&s, &AnswerValue::default(), &strict(0.0)).unwrap(),
            Evaluation::ZERO
        );
    }

    // --- fill_blank ---

    #[test]
    fn fill_blank_trims_and_ignores_case() {
        let s = snap("fill_blank", strs(&["Paris"]), None);
        let eval = evaluate_answer(&s, &strs(&[" paris "]), &strict(0.0)).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.marks_awarded, 1.0);
    }

    #[test]
    fn fill_blank_accepts_alternate_spellings() {
        let s = snap("fill_blank", strs(&["colour", "color"]), Some(2.0));
        let eval = evaluate_answer(&s, &strs(&["COLOR"]), &strict(0.0)).unwrap();
        assert!(eval.is_correct);
    }

    #[test]
    fn fill_blank_never_applies_negative_marking() {
        let s = snap("fill_blank", strs(&["Paris"]), Some(2.0));
        let eval = evaluate_answer(&s, &strs(&["London"]), &strict(-5.0)).unwrap();
        assert_eq!(eval, Evaluation::ZERO);
    }

    // --- match ---

    #[test]
    fn match_strict_partial_answer_is_wrong() {
        let s = snap("match", pairs_of(&[("1", "a"), ("2", "b")]), Some(4.0));
        let eval = evaluate_answer(&s, &pairs_of(&[("1", "a")]), &strict(-2.0)).unwrap();
        assert_eq!(eval, Evaluation::ZERO);
    }

    #[test]
    fn match_strict_order_does_not_matter() {
        let s = snap("match", pairs_of(&[("1", "a"), ("2", "b")]), Some(4.0));
        let eval = evaluate_answer(&s, &pairs_of(&[("2", "b"), ("1", "a")]), &strict(0.0)).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.marks_awarded, 4.0);
    }

    #[test]
    fn match_partial_awards_proportionally() {
        let s = snap(
            "match",
            pairs_of(&[("1", "a"), ("2", "b"), ("3", "c"), ("4", "d")]),
            Some(8.0),
        );
        let eval = evaluate_answer(
            &s,
            &pairs_of(&[("1", "a"), ("2", "c"), ("3", "c")]),
            &partial(),
        )
        .unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.marks_awarded, 4.0);
    }

    #[test]
    fn match_partial_all_pairs_is_correct() {
        let s = snap("match", pairs_of(&[("1", "a"), ("2", "b")]), Some(8.0));
        let eval =
            evaluate_answer(&s, &pairs_of(&[("1", "a"), ("2", "b")]), &partial()).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.marks_awarded, 8.0);
    }

    #[test]
    fn match_partial_duplicate_pairs_cannot_exceed_marks() {
        let s = snap("match", pairs_of(&[("1", "a"), ("2", "b")]), Some(8.0));
        let eval =
            evaluate_answer(&s, &pairs_of(&[("1", "a"), ("1", "a")]), &partial()).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.marks_awarded, 4.0);
    }

    // --- malformed input ---

    #[test]
    fn unknown_type_is_unsupported() {
        let s = snap("essay", strs(&["x"]), None);
        assert_eq!(
            evaluate_answer(&s, &strs(&["x"]), &strict(0.0)),
            Err(AnswerError::UnsupportedQuestionType("essay".into()))
        );
    }

    #[test]
    fn empty_key_is_flagged_in_every_mode() {
        for question_type in ["mcq_single", "mcq_multi", "match"] {
            let s = snap(question_type, AnswerValue::default(), Some(5.0));
            assert_eq!(
                evaluate_answer(&s, &AnswerValue::default(), &partial()),
                Err(AnswerError::EmptyAnswerKey),
                "{question_type}"
            );
        }
    }

    #[test]
    fn wrong_answer_shape_is_flagged() {
        let s = snap("match", pairs_of(&[("1", "a")]), None);
        assert!(matches!(
            evaluate_answer(&s, &strs(&["a"]), &strict(0.0)),
            Err(AnswerError::AnswerShape { field: "answer", .. })
        ));

        let s = snap("mcq_single", pairs_of(&[("1", "a")]), None);
        assert!(matches!(
            evaluate_answer(&s, &strs(&["a"]), &strict(0.0)),
            Err(AnswerError::AnswerShape {
                field: "correctAnswers",
                ..
            })
        ));
    }

    #[test]
    fn negative_marks_are_invalid() {
        let s = snap("mcq_single", strs(&["a"]), Some(-3.0));
        assert_eq!(
            evaluate_answer(&s, &strs(&["a"]), &strict(0.0)),
            Err(AnswerError::InvalidMarks(-3.0))
        );
    }

    #[test]
    fn explicit_zero_marks_are_kept() {
        let s = snap("mcq_single", strs(&["a"]), Some(0.0));
        let eval = evaluate_answer(&s, &strs(&["a"]), &strict(0.0)).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.marks_awarded, 0.0);
    }
}
