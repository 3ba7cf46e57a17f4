//! Letter grade classification.

use crate::model::{Grade, GradingThresholds};

/// Percentage of `total_marks` obtained. A non-positive or non-finite
/// denominator yields 0.
pub fn percentage(obtained: f64, total_marks: f64) -> f64 {
    if !total_marks.is_finite() || total_marks <= 0.0 {
        return 0.0;
    }
    obtained / total_marks * 100.0
}

/// Map a percentage to a grade. Cutoffs are inclusive lower bounds checked
/// in the order A, B, C, D; the first match wins.
pub fn classify(percentage: f64, thresholds: &GradingThresholds) -> Grade {
    [
        (Grade::A, thresholds.a),
        (Grade::B, thresholds.b),
        (Grade::C, thresholds.c),
        (Grade::D, thresholds.d),
    ]
    .into_iter()
    .find(|(_, cutoff)| percentage >= *cutoff)
    .map(|(grade, _)| grade)
    .unwrap_or(Grade::F)
}
