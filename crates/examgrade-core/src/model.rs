//! Core document types for examgrade.
//!
//! These mirror the exam and attempt documents held by the document store.
//! Field names are serialized in camelCase so a stored document can be
//! loaded and written back without translation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An exam definition. Read-only to the grading engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    /// Unique identifier for this exam.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Maximum obtainable marks, used as the percentage denominator.
    pub total_marks: f64,
    /// Scoring options. Every field is optional and resolved once per evaluation.
    #[serde(default)]
    pub settings: Option<ExamSettings>,
}

/// Exam-level scoring options as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSettings {
    /// Marks applied per incorrect answer (zero or negative).
    #[serde(default)]
    pub negative_marking: Option<f64>,
    /// Award proportional marks for partially correct multi-part answers.
    #[serde(default)]
    pub allow_partial_scoring: Option<bool>,
    /// Percentage cutoffs for letter grades.
    #[serde(default)]
    pub grading: Option<GradingThresholds>,
}

/// Inclusive lower-bound percentage cutoffs for each passing grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingThresholds {
    #[serde(rename = "A", default = "default_a")]
    pub a: f64,
    #[serde(rename = "B", default = "default_b")]
    pub b: f64,
    #[serde(rename = "C", default = "default_c")]
    pub c: f64,
    #[serde(rename = "D", default = "default_d")]
    pub d: f64,
}

fn default_a() -> f64 {
    85.0
}
fn default_b() -> f64 {
    70.0
}
fn default_c() -> f64 {
    50.0
}
fn default_d() -> f64 {
    35.0
}

impl Default for GradingThresholds {
    fn default() -> Self {
        Self {
            a: default_a(),
            b: default_b(),
            c: default_c(),
            d: default_d(),
        }
    }
}

impl GradingThresholds {
    /// Returns `true` if the cutoffs are in non-increasing order A ≥ B ≥ C ≥ D.
    pub fn is_descending(&self) -> bool {
        self.a >= self.b && self.b >= self.c && self.c >= self.d
    }
}

/// One learner's recorded submission for one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    /// Unique identifier for this attempt.
    pub id: String,
    /// Identifier of the exam this attempt belongs to.
    pub exam: String,
    /// Identifier of the learner, if recorded.
    #[serde(default)]
    pub student: Option<String>,
    /// Recorded answers, in question order.
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// Sum of awarded marks. Overwritten on evaluation.
    #[serde(default)]
    pub total_marks_obtained: f64,
    /// Lifecycle state.
    #[serde(default)]
    pub status: AttemptStatus,
    /// Letter grade. Set on evaluation.
    #[serde(default)]
    pub grade: Option<Grade>,
    /// When the attempt was last evaluated.
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of an attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    #[default]
    InProgress,
    Submitted,
    Evaluated,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::InProgress => write!(f, "in_progress"),
            AttemptStatus::Submitted => write!(f, "submitted"),
            AttemptStatus::Evaluated => write!(f, "evaluated"),
        }
    }
}

/// One answer inside an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Question identifier in the question bank, if recorded.
    #[serde(default)]
    pub question: Option<String>,
    /// Frozen copy of the question's grading-relevant fields.
    pub snapshot: QuestionSnapshot,
    /// The learner's response. Absent or null means unanswered.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: AnswerValue,
    /// Whether the answer was judged fully correct.
    #[serde(default)]
    pub is_correct: bool,
    /// Marks awarded for this answer (never negative).
    #[serde(default)]
    pub marks_obtained: f64,
}

/// Immutable copy of a question captured at attempt time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    /// Question type tag as stored (e.g. "mcq_single").
    pub question_type: String,
    /// Accepted answers or pairs.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub correct_answers: AnswerValue,
    /// Marks for a fully correct answer. Absent means 1.
    #[serde(default)]
    pub marks: Option<f64>,
}

/// The shape of an answer or answer key: a list of strings or a list of pairs.
///
/// Anything else is kept verbatim as `Malformed` so one bad answer does not
/// make the whole attempt unreadable. It is written back unchanged on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choices(Vec<String>),
    Pairs(Vec<MatchPair>),
    Malformed(serde_json::Value),
}

impl Default for AnswerValue {
    fn default() -> Self {
        AnswerValue::Choices(Vec::new())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<AnswerValue, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<AnswerValue>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnswerValue {
    /// Borrow as a list of choices. An empty pair list counts as empty choices.
    pub fn as_choices(&self) -> Option<&[String]> {
        match self {
            AnswerValue::Choices(c) => Some(c),
            AnswerValue::Pairs(p) if p.is_empty() => Some(&[]),
            AnswerValue::Pairs(_) | AnswerValue::Malformed(_) => None,
        }
    }

    /// Borrow as a list of pairs. An empty choice list counts as empty pairs.
    pub fn as_pairs(&self) -> Option<&[MatchPair]> {
        match self {
            AnswerValue::Pairs(p) => Some(p),
            AnswerValue::Choices(c) if c.is_empty() => Some(&[]),
            AnswerValue::Choices(_) | AnswerValue::Malformed(_) => None,
        }
    }

    /// `true` for an empty list of either shape. A malformed value is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Choices(c) => c.is_empty(),
            AnswerValue::Pairs(p) => p.is_empty(),
            AnswerValue::Malformed(_) => false,
        }
    }
}

/// A key/value pair for match-type questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchPair {
    pub key: String,
    pub value: String,
}

impl MatchPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The five supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    McqSingle,
    McqMulti,
    TrueFalse,
    FillBlank,
    Match,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::McqSingle => write!(f, "mcq_single"),
            QuestionType::McqMulti => write!(f, "mcq_multi"),
            QuestionType::TrueFalse => write!(f, "true_false"),
            QuestionType::FillBlank => write!(f, "fill_blank"),
            QuestionType::Match => write!(f, "match"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq_single" => Ok(QuestionType::McqSingle),
            "mcq_multi" => Ok(QuestionType::McqMulti),
            "true_false" => Ok(QuestionType::TrueFalse),
            "fill_blank" => Ok(QuestionType::FillBlank),
            "match" => Ok(QuestionType::Match),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// All grades in classification order.
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}
