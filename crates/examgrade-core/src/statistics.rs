//! Exam-level statistics over evaluated attempts.

use serde::{Deserialize, Serialize};

use crate::grade::percentage;
use crate::model::{Attempt, AttemptStatus, Exam, Grade};

/// Aggregate statistics for one exam.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExamSummary {
    /// Number of evaluated attempts included.
    pub attempt_count: usize,
    /// Mean total marks.
    pub mean_total: f64,
    /// Mean percentage of the exam's total marks.
    pub mean_percentage: f64,
    /// Highest total marks.
    pub highest_total: f64,
    /// Lowest total marks.
    pub lowest_total: f64,
    /// Attempts per grade, in grade order A to F.
    pub grade_distribution: Vec<GradeCount>,
    /// Per-question statistics by answer position.
    pub per_question: Vec<QuestionStats>,
}

/// Number of attempts that received a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
}

/// Statistics for one question position across attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStats {
    /// Zero-based answer position.
    pub index: usize,
    /// Question type tag from the first snapshot seen at this position.
    pub question_type: String,
    /// Number of attempts that had an answer at this position.
    pub answered: usize,
    /// Fraction of those answers judged fully correct.
    pub correct_rate: f64,
    /// Mean marks awarded.
    pub mean_marks: f64,
}

/// Summarize the evaluated attempts of an exam. Attempts in any other state
/// are ignored.
pub fn summarize(exam: &Exam, attempts: &[Attempt]) -> ExamSummary {
    let evaluated: Vec<&Attempt> = attempts
        .iter()
        .filter(|a| a.status == AttemptStatus::Evaluated)
        .collect();

    let grade_distribution = Grade::ALL
        .iter()
        .map(|&grade| GradeCount {
            grade,
            count: evaluated.iter().filter(|a| a.grade == Some(grade)).count(),
        })
        .collect();

    if evaluated.is_empty() {
        return ExamSummary {
            grade_distribution,
            ..Default::default()
        };
    }

    let n = evaluated.len() as f64;
    let totals: Vec<f64> = evaluated.iter().map(|a| a.total_marks_obtained).collect();
    let mean_total = totals.iter().sum::<f64>() / n;
    let mean_percentage = totals
        .iter()
        .map(|&t| percentage(t, exam.total_marks))
        .sum::<f64>()
        / n;
    let highest_total = totals.iter().copied().fold(f64::MIN, f64::max);
    let lowest_total = totals.iter().copied().fold(f64::MAX, f64::min);

    let positions = evaluated.iter().map(|a| a.answers.len()).max().unwrap_or(0);
    let per_question = (0..positions)
        .map(|index| {
            let answers: Vec<_> = evaluated
                .iter()
                .filter_map(|a| a.answers.get(index))
                .collect();
            let answered = answers.len();
            let correct = answers.iter().filter(|a| a.is_correct).count();
            let marks: f64 = answers.iter().map(|a| a.marks_obtained).sum();
            QuestionStats {
                index,
                question_type: answers
                    .first()
                    .map(|a| a.snapshot.question_type.clone())
                    .unwrap_or_default(),
                answered,
                correct_rate: correct as f64 / answered.max(1) as f64,
                mean_marks: marks / answered.max(1) as f64,
            }
        })
        .collect();

    ExamSummary {
        attempt_count: evaluated.len(),
        mean_total,
        mean_percentage,
        highest_total,
        lowest_total,
        grade_distribution,
        per_question,
    }
}

impl ExamSummary {
    /// Count for a single grade.
    pub fn count(&self, grade: Grade) -> usize {
        self.grade_distribution
            .iter()
            .find(|g| g.grade == grade)
            .map(|g| g.count)
            .unwrap_or(0)
    }
}
