//! In-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use examgrade_core::model::{Attempt, Exam};
use examgrade_core::traits::{AttemptListing, AttemptStore, ExamStore};

use crate::error::StoreError;

/// A store holding exams and attempts in memory.
///
/// Useful for tests and for grading documents that were loaded elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    exams: RwLock<HashMap<String, Exam>>,
    attempts: RwLock<HashMap<String, Attempt>>,
    save_count: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from documents.
    pub fn with_documents(exams: Vec<Exam>, attempts: Vec<Attempt>) -> Self {
        Self {
            exams: RwLock::new(exams.into_iter().map(|e| (e.id.clone(), e)).collect()),
            attempts: RwLock::new(attempts.into_iter().map(|a| (a.id.clone(), a)).collect()),
            save_count: AtomicU32::new(0),
        }
    }

    pub fn insert_exam(&self, exam: Exam) -> Result<(), StoreError> {
        self.exams
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(exam.id.clone(), exam);
        Ok(())
    }

    pub fn insert_attempt(&self, attempt: Attempt) -> Result<(), StoreError> {
        self.attempts
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(attempt.id.clone(), attempt);
        Ok(())
    }

    /// Get the number of `save` calls made to this store.
    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::Relaxed)
    }

    /// Snapshot of a stored attempt.
    pub fn attempt(&self, id: &str) -> Option<Attempt> {
        self.attempts.read().ok()?.get(id).cloned()
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Attempt>> {
        let attempts = self.attempts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(attempts.get(id).cloned())
    }

    async fn save(&self, attempt: &Attempt) -> anyhow::Result<()> {
        self.save_count.fetch_add(1, Ordering::Relaxed);
        self.insert_attempt(attempt.clone())?;
        Ok(())
    }

    async fn list_by_exam(&self, exam_id: &str) -> anyhow::Result<AttemptListing> {
        let attempts = self.attempts.read().map_err(|_| StoreError::Poisoned)?;
        let mut found: Vec<Attempt> = attempts
            .values()
            .filter(|a| a.exam == exam_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found.into())
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Exam>> {
        let exams = self.exams.read().map_err(|_| StoreError::Poisoned)?;
        Ok(exams.get(id).cloned())
    }
}
