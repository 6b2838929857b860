// file: src/utils/validation.rs
// description: input validation for documents, metadata, vectors and paths
// reference: input validation patterns

use crate::error::{Result, SearchError};
use crate::models::Metadata;
use std::fs;
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_file_path(path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path).map_err(|e| {
            SearchError::Validation(format!(
                "Cannot canonicalize path {}: {}",
                path.display(),
                e
            ))
        })?;

        if !canonical.is_file() {
            return Err(SearchError::Validation(format!(
                "Path is not a file: {}",
                canonical.display()
            )));
        }

        Ok(())
    }

    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(SearchError::Validation("Content is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_metadata(meta: &Metadata) -> Result<()> {
        for key in meta.keys() {
            if key.trim().is_empty() {
                return Err(SearchError::Validation(
                    "Metadata keys must not be empty".to_string(),
                ));
            }
            if key.chars().any(char::is_control) {
                return Err(SearchError::Validation(format!(
                    "Metadata key contains control characters: {:?}",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Checks dimensionality and rejects NaN/infinite components.
    pub fn validate_vector(vector: &[f32], expected_dim: usize) -> Result<()> {
        if vector.len() != expected_dim {
            return Err(SearchError::DimensionMismatch {
                expected: expected_dim,
                actual: vector.len(),
            });
        }
        if let Some(pos) = vector.iter().position(|x| !x.is_finite()) {
            return Err(SearchError::Model(format!(
                "Vector component {} is not finite",
                pos
            )));
        }
        Ok(())
    }

    pub fn validate_top_k(k: usize) -> Result<()> {
        if k == 0 {
            return Err(SearchError::Validation(
                "k must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    pub fn count_tokens(text: &str) -> usize {
        text.split_whitespace().count()
    }

    /// Keeps at most `max_tokens` whitespace-separated tokens.
    pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
        text.split_whitespace()
            .take(max_tokens)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
