// file: src/models/document.rs
// description: document model, typed metadata and input validation
// reference: internal data structures

use crate::error::{Result, SearchError};
use crate::utils::Validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// String-keyed, string-valued document metadata (title, author, link, ...).
pub type Metadata = BTreeMap<String, String>;

/// Store-assigned identifier. Ids are handed out in increasing order, so id
/// order is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(DocumentId)
            .map_err(|_| SearchError::Validation(format!("Invalid document id: {}", s)))
    }
}

/// A document that has not been written yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub content: String,
    #[serde(default)]
    pub meta: Metadata,
}

impl NewDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            meta: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Parses `{"content": "...", "meta": {"k": "v"}}`. `metadata` is accepted
    /// as an alias for `meta`. Every metadata value must be a JSON string.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            SearchError::Validation("Document must be a JSON object".to_string())
        })?;

        let content = match object.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(SearchError::Validation(
                    "Document content must be a string".to_string(),
                ));
            }
            None => {
                return Err(SearchError::Validation(
                    "Document is missing content".to_string(),
                ));
            }
        };

        let mut meta = Metadata::new();
        match object.get("meta").or_else(|| object.get("metadata")) {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    match value {
                        Value::String(s) => {
                            meta.insert(key.clone(), s.clone());
                        }
                        other => {
                            return Err(SearchError::Validation(format!(
                                "Metadata value for '{}' must be a string, got {}",
                                key,
                                json_type_name(other)
                            )));
                        }
                    }
                }
            }
            Some(other) => {
                return Err(SearchError::Validation(format!(
                    "Metadata must be an object, got {}",
                    json_type_name(other)
                )));
            }
        }

        let document = Self { content, meta };
        document.validate()?;
        Ok(document)
    }

    pub fn validate(&self) -> Result<()> {
        Validator::validate_content_not_empty(&self.content)?;
        Validator::validate_metadata(&self.meta)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub content: String,
    pub meta: Metadata,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub(crate) fn from_new(id: DocumentId, new: NewDocument) -> Self {
        let content_hash = Self::compute_hash(&new.content);
        Self {
            id,
            content: new.content,
            meta: new.meta,
            content_hash,
            created_at: Utc::now(),
        }
    }

    pub fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn title(&self) -> Option<&str> {
        self.meta.get("title").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_document_creation() {
        let new = NewDocument::new("Faiss is a library for similarity search.")
            .with_meta("title", "T");
        let doc = Document::from_new(DocumentId(0), new);

        assert_eq!(doc.id, DocumentId(0));
        assert_eq!(doc.title(), Some("T"));
        assert_eq!(doc.content_hash.len(), 64);
    }

    #[test]
    fn test_hash_consistency() {
        let hash1 = Document::compute_hash("Test content");
        let hash2 = Document::compute_hash("Test content");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, Document::compute_hash("Other content"));
    }

    #[test]
    fn test_from_json_accepts_meta_and_metadata() {
        let doc = NewDocument::from_json(&json!({
            "content": "text",
            "meta": {"title": "A", "author": "B"}
        }))
        .unwrap();
        assert_eq!(doc.meta.get("author").map(String::as_str), Some("B"));

        let doc = NewDocument::from_json(&json!({
            "content": "text",
            "metadata": {"link": "https://example.com"}
        }))
        .unwrap();
        assert_eq!(doc.meta.len(), 1);
    }

    #[test]
    fn test_from_json_rejects_non_string_metadata() {
        let err = NewDocument::from_json(&json!({
            "content": "text",
            "meta": {"year": 2023}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_from_json_rejects_empty_content() {
        let err = NewDocument::from_json(&json!({"content": "   "})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = NewDocument::from_json(&json!({"meta": {}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_document_id_parse() {
        assert_eq!("42".parse::<DocumentId>().unwrap(), DocumentId(42));
        assert!("abc".parse::<DocumentId>().is_err());
    }
}
