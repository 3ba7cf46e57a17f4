//! Store traits for attempts and exams.
//!
//! These async traits are implemented by the `examgrade-store` crate. The
//! grading engine only ever reads exams and reads/replaces whole attempts.

use async_trait::async_trait;

use crate::model::{Attempt, Exam};

/// Storage for attempt documents.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Fetch an attempt by id. `Ok(None)` if it does not exist.
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Attempt>>;

    /// Replace the stored attempt with `attempt` as a single write.
    async fn save(&self, attempt: &Attempt) -> anyhow::Result<()>;

    /// All attempts belonging to an exam, plus any stored attempt that could
    /// not be read and may belong to it.
    async fn list_by_exam(&self, exam_id: &str) -> anyhow::Result<AttemptListing>;
}

/// Result of listing an exam's attempts.
#[derive(Debug, Clone, Default)]
pub struct AttemptListing {
    pub attempts: Vec<Attempt>,
    pub unreadable: Vec<UnreadableAttempt>,
}

/// A stored attempt whose document failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableAttempt {
    /// Id taken from the storage key, since the document itself is unreadable.
    pub attempt_id: String,
    pub reason: String,
}

impl From<Vec<Attempt>> for AttemptListing {
    fn from(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts,
            unreadable: Vec::new(),
        }
    }
}

/// Read-only storage for exam documents.
#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Fetch an exam by id. `Ok(None)` if it does not exist.
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Exam>>;
}
