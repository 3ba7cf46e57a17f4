//! Scoring settings resolution.
//!
//! All exam-level defaults are applied here, once per evaluation, so the
//! evaluators only ever see fully populated values.

use crate::model::{Exam, GradingThresholds};

/// Fully resolved scoring options consumed by the evaluators and classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSettings {
    /// Marks awarded for an incorrect answer, before clamping into
    /// `[0, marks]`. Normally zero or negative.
    pub negative_marking: f64,
    /// Whether multi-part questions earn proportional credit.
    pub allow_partial_scoring: bool,
    /// Grade cutoffs.
    pub grading: GradingThresholds,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            negative_marking: 0.0,
            allow_partial_scoring: false,
            grading: GradingThresholds::default(),
        }
    }
}

impl ResolvedSettings {
    /// Resolve an exam's settings, falling back to `default_grading` when the
    /// exam defines no thresholds.
    pub fn resolve(exam: &Exam, default_grading: &GradingThresholds) -> Self {
        let Some(settings) = &exam.settings else {
            return Self {
                grading: *default_grading,
                ..Self::default()
            };
        };

        let negative_marking = match settings.negative_marking {
            Some(v) if !v.is_finite() => {
                tracing::warn!(exam = %exam.id, "non-finite negativeMarking {v}, using 0");
                0.0
            }
            Some(v) if v > 0.0 => {
                tracing::warn!(
                    exam = %exam.id,
                    "negativeMarking {v} is positive; incorrect answers will earn marks"
                );
                v
            }
            Some(v) => v,
            None => 0.0,
        };

        Self {
            negative_marking,
            allow_partial_scoring: settings.allow_partial_scoring.unwrap_or(false),
            grading: settings.grading.unwrap_or(*default_grading),
        }
    }
}
