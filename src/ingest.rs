// file: src/ingest.rs
// description: reads documents to index from JSON or plain text files

use crate::error::{Result, SearchError};
use crate::models::NewDocument;
use crate::utils::Validator;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads one file into documents. A `.json` file holds a single document
/// object or an array of them; any other file becomes one document whose
/// `title` is the file stem.
pub fn read_documents(path: &Path) -> Result<Vec<NewDocument>> {
    Validator::validate_file_path(path)?;
    let content = fs::read_to_string(path).map_err(|e| SearchError::io(path, e))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let documents = if is_json {
        parse_json(&content)?
    } else {
        Validator::validate_content_not_empty(&content)?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        vec![NewDocument::new(content).with_meta("title", title)]
    };

    debug!("Read {} document(s) from {}", documents.len(), path.display());
    Ok(documents)
}

pub fn parse_json(content: &str) -> Result<Vec<NewDocument>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| SearchError::Validation(format!("Invalid JSON document file: {}", e)))?;

    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(pos, item)| {
                NewDocument::from_json(item).map_err(|e| {
                    SearchError::Validation(format!("entry {}: {}", pos, e))
                })
            })
            .collect(),
        other => Ok(vec![NewDocument::from_json(&other)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_single_object() {
        let docs = parse_json(
            r#"{"content": "Faiss is a library.", "meta": {"title": "Semantic Search", "author": "ThreadWaiting"}}"#,
        )
        .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].meta["author"], "ThreadWaiting");
    }

    #[test]
    fn test_array_reports_bad_entry() {
        let err = parse_json(r#"[{"content": "ok"}, {"content": "bad", "meta": {"n": 1}}]"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_plain_text_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("faiss-notes.md");
        fs::write(&path, "Faiss supports exact and approximate search.").unwrap();

        let docs = read_documents(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].meta["title"], "faiss-notes");
    }

    #[test]
    fn test_empty_text_file_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.txt");
        fs::write(&path, "\n").unwrap();
        assert_eq!(
            read_documents(&path).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
