//! Error types for dataset loading.

use std::path::PathBuf;
use thiserror::Error;

/// Resource-level failure: the whole load produced no data.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("dataset not found: {}", path.display())]
    ResourceNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset must be a JSON array of records, found {found}")]
    Malformed { found: &'static str },

    #[error("background load task failed: {0}")]
    Task(String),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::ResourceNotFound { .. })
    }
}

/// Why a single record was skipped. Never aborts a load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("field {field} should be {expected}")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("duplicate id {0}")]
    DuplicateId(i64),

    #[error("invalid record: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("failed to read vocabulary {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid vocabulary {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
