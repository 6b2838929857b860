// file: src/error.rs
// description: error taxonomy with stable kinds and exit codes
// reference: https://docs.rs/thiserror

use crate::models::DocumentId;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Why a single embedding could not be produced or stored.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingCause {
    Model(String),
    Timeout,
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for EmbeddingCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingCause::Model(msg) => write!(f, "model failure: {}", msg),
            EmbeddingCause::Timeout => write!(f, "deadline exceeded"),
            EmbeddingCause::DimensionMismatch { expected, actual } => write!(
                f,
                "vector has dimension {}, expected {}",
                actual, expected
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Embedding error: {cause}")]
    Embedding { cause: EmbeddingCause },

    #[error(
        "Embedding failed for {} document(s), {stored} vector(s) stored",
        .failures.len()
    )]
    EmbeddingBatch {
        stored: usize,
        failures: Vec<(DocumentId, EmbeddingCause)>,
    },

    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Stable, programmatically matchable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    Model,
    Embedding,
    Io,
    CorruptSnapshot,
    DimensionMismatch,
    NotFound,
    Serialization,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Config => "E_CONFIG",
            ErrorKind::Validation => "E_VALIDATION",
            ErrorKind::Model => "E_MODEL",
            ErrorKind::Embedding => "E_EMBEDDING",
            ErrorKind::Io => "E_IO",
            ErrorKind::CorruptSnapshot => "E_CORRUPT_SNAPSHOT",
            ErrorKind::DimensionMismatch => "E_DIMENSION_MISMATCH",
            ErrorKind::NotFound => "E_NOT_FOUND",
            ErrorKind::Serialization => "E_SERIALIZATION",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Validation => 3,
            ErrorKind::Model => 4,
            ErrorKind::Embedding => 5,
            ErrorKind::Io => 6,
            ErrorKind::CorruptSnapshot => 7,
            ErrorKind::DimensionMismatch => 8,
            ErrorKind::NotFound => 9,
            ErrorKind::Serialization => 10,
        }
    }
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Config(_) => ErrorKind::Config,
            SearchError::Validation(_) => ErrorKind::Validation,
            SearchError::Model(_) => ErrorKind::Model,
            SearchError::Embedding { .. } | SearchError::EmbeddingBatch { .. } => {
                ErrorKind::Embedding
            }
            SearchError::Io { .. } => ErrorKind::Io,
            SearchError::CorruptSnapshot(_) => ErrorKind::CorruptSnapshot,
            SearchError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            SearchError::NotFound(_) => ErrorKind::NotFound,
            SearchError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SearchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn timeout() -> Self {
        SearchError::Embedding {
            cause: EmbeddingCause::Timeout,
        }
    }

    /// Collapses an embedder failure into the cause recorded for one document.
    pub fn into_embedding_cause(self) -> EmbeddingCause {
        match self {
            SearchError::Embedding { cause } => cause,
            SearchError::DimensionMismatch { expected, actual } => {
                EmbeddingCause::DimensionMismatch { expected, actual }
            }
            SearchError::Model(msg) => EmbeddingCause::Model(msg),
            other => EmbeddingCause::Model(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(
            SearchError::NotFound(DocumentId(7)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(SearchError::timeout().kind(), ErrorKind::Embedding);
        let batch = SearchError::EmbeddingBatch {
            stored: 1,
            failures: vec![(DocumentId(2), EmbeddingCause::Timeout)],
        };
        assert_eq!(batch.kind(), ErrorKind::Embedding);
        assert!(batch.to_string().contains("1 document(s)"));
    }

    #[test]
    fn test_exit_codes_are_nonzero_and_distinct() {
        let kinds = [
            ErrorKind::Config,
            ErrorKind::Validation,
            ErrorKind::Model,
            ErrorKind::Embedding,
            ErrorKind::Io,
            ErrorKind::CorruptSnapshot,
            ErrorKind::DimensionMismatch,
            ErrorKind::NotFound,
            ErrorKind::Serialization,
        ];
        let mut codes: Vec<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_into_embedding_cause() {
        let cause = SearchError::Model("empty input".to_string()).into_embedding_cause();
        assert_eq!(cause, EmbeddingCause::Model("empty input".to_string()));

        let cause = SearchError::DimensionMismatch {
            expected: 4,
            actual: 3,
        }
        .into_embedding_cause();
        assert_eq!(
            cause,
            EmbeddingCause::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        );
    }
}
