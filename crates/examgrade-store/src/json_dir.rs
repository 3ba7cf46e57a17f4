//! Directory-of-JSON-documents store.
//!
//! Layout:
//!
//! ```text
//! <root>/exams/<exam-id>.json
//! <root>/attempts/<attempt-id>.json
//! ```
//!
//! Attempt saves go through a temporary file in the same directory that is
//! renamed over the target, so a reader never sees a half-written document.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use examgrade_core::model::{Attempt, Exam};
use examgrade_core::traits::{AttemptListing, AttemptStore, ExamStore, UnreadableAttempt};

use crate::error::{validate_id, StoreError};

const EXAMS_DIR: &str = "exams";
const ATTEMPTS_DIR: &str = "attempts";

/// A store backed by one JSON file per document.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

/// A document that failed to load during a directory scan.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: StoreError,
}

impl JsonDirStore {
    /// Open a store rooted at `root`. The directory does not need to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the `exams/` and `attempts/` directories.
    pub fn init(&self) -> Result<(), StoreError> {
        for dir in [EXAMS_DIR, ATTEMPTS_DIR] {
            let path = self.root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| StoreError::io(path, e))?;
        }
        Ok(())
    }

    fn exam_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.root.join(EXAMS_DIR).join(format!("{id}.json")))
    }

    fn attempt_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.root.join(ATTEMPTS_DIR).join(format!("{id}.json")))
    }

    /// Write an exam document. Used for seeding; the grading engine never
    /// writes exams.
    pub async fn put_exam(&self, exam: &Exam) -> anyhow::Result<()> {
        let path = self.exam_path(&exam.id)?;
        write_atomic(path, exam).await
    }

    /// Load every exam, returning the ones that parsed and the ones that did not.
    pub async fn scan_exams(&self) -> anyhow::Result<(Vec<Exam>, Vec<LoadFailure>)> {
        scan_dir(&self.root.join(EXAMS_DIR)).await
    }

    /// Load every attempt, returning the ones that parsed and the ones that did not.
    pub async fn scan_attempts(&self) -> anyhow::Result<(Vec<Attempt>, Vec<LoadFailure>)> {
        scan_dir(&self.root.join(ATTEMPTS_DIR)).await
    }
}

/// A stored document addressed by its `id`.
trait Document: DeserializeOwned {
    fn id(&self) -> &str;
}

impl Document for Exam {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Attempt {
    fn id(&self) -> &str {
        &self.id
    }
}

async fn read_doc<T: Document>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let doc: T = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    // A save goes to `<id>.json`, so a mismatched document would leave this
    // file stale forever.
    let expected = file_stem(path);
    if doc.id() != expected {
        return Err(StoreError::IdMismatch {
            path: path.to_path_buf(),
            expected,
            found: doc.id().to_string(),
        });
    }
    Ok(Some(doc))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Best-effort read of the `exam` reference of an attempt that failed to load.
async fn raw_exam_ref(path: &Path) -> Option<String> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value.get("exam")?.as_str().map(str::to_string)
}

async fn scan_dir<T: Document>(dir: &Path) -> anyhow::Result<(Vec<T>, Vec<LoadFailure>)> {
    let mut docs = Vec::new();
    let mut failures = Vec::new();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((docs, failures)),
        Err(e) => return Err(StoreError::io(dir, e).into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to list {}", dir.display()))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        match read_doc::<T>(&path).await {
            Ok(Some(doc)) => docs.push(doc),
            Ok(None) => {}
            Err(error) => failures.push(LoadFailure { path, error }),
        }
    }
    Ok((docs, failures))
}

async fn write_atomic<T: Serialize>(path: PathBuf, doc: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(doc).context("failed to serialize document")?;
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, json.as_bytes()))
        .await
        .context("store writer task panicked")??;
    Ok(())
}

fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&parent).map_err(|e| StoreError::io(&parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| StoreError::io(&parent, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    tmp.flush().map_err(|e| StoreError::io(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

#[async_trait]
impl AttemptStore for JsonDirStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Attempt>> {
        let path = self.attempt_path(id)?;
        Ok(read_doc(&path).await?)
    }

    async fn save(&self, attempt: &Attempt) -> anyhow::Result<()> {
        let path = self.attempt_path(&attempt.id)?;
        tracing::debug!(path = %path.display(), "saving attempt");
        write_atomic(path, attempt).await
    }

    async fn list_by_exam(&self, exam_id: &str) -> anyhow::Result<AttemptListing> {
        let (attempts, failures) = self.scan_attempts().await?;

        let mut unreadable = Vec::new();
        for failure in failures {
            // Unreadable documents that still name another exam are not ours.
            // Anything we cannot attribute is reported to every exam.
            if let Some(other) = raw_exam_ref(&failure.path).await {
                if other != exam_id {
                    continue;
                }
            }
            tracing::warn!(
                path = %failure.path.display(),
                "unreadable attempt: {}",
                failure.error
            );
            unreadable.push(UnreadableAttempt {
                attempt_id: file_stem(&failure.path),
                reason: failure.error.to_string(),
            });
        }

        Ok(AttemptListing {
            attempts: attempts.into_iter().filter(|a| a.exam == exam_id).collect(),
            unreadable,
        })
    }
}

#[async_trait]
impl ExamStore for JsonDirStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Exam>> {
        let path = self.exam_path(id)?;
        Ok(read_doc(&path).await?)
    }
}
