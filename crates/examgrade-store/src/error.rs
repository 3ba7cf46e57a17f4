//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id cannot be mapped to a document path.
    #[error("invalid document id '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidId(String),

    /// Reading or writing a document failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored document is not valid JSON for its type.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A document's `id` does not match the file it is stored in.
    #[error("{path} holds document id '{found}', expected '{expected}'")]
    IdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// An internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Validate that an id is safe to use as a file stem.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}
