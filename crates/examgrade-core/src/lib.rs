//! examgrade-core: Exam auto-grading engine.
//!
//! This crate defines the attempt/exam data model, the per-question-type
//! evaluators, score aggregation, grade classification, and the engine that
//! finalizes attempts against a store.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod grade;
pub mod model;
pub mod report;
pub mod settings;
pub mod statistics;
pub mod traits;
pub mod validate;

pub use engine::{GradingEngine, GradingEngineConfig};
pub use error::{AnswerError, GradingError};
