// file: src/models/search_result.rs
// description: ranked search results with similarity scores
// reference: Used for vector similarity search results

use crate::models::{Document, DocumentId};
use serde::{Deserialize, Serialize};

/// One entry of an index search: an id and its score, higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocumentId,
    pub score: f32,
}

/// A search hit resolved to its document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub document: Document,
    pub score: f32,
}

impl QueryResult {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }

    /// Score as a percentage rounded to two decimals.
    pub fn score_percent(&self) -> f64 {
        (f64::from(self.score) * 10_000.0).round() / 100.0
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let title = self.document.title().unwrap_or("(untitled)");
        let content_preview = truncate_chars(&self.document.content, max_content_len);

        format!(
            "{} [id {}]\n{}\nMatch score: {:.2} %\n",
            title,
            self.document.id,
            content_preview,
            self.score_percent()
        )
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDocument;

    fn result(content: &str, score: f32) -> QueryResult {
        let doc = Document::from_new(
            DocumentId(3),
            NewDocument::new(content).with_meta("title", "Semantic Search"),
        );
        QueryResult::new(doc, score)
    }

    #[test]
    fn test_score_percent() {
        assert_eq!(result("x", 0.87654).score_percent(), 87.65);
        assert_eq!(result("x", 1.0).score_percent(), 100.0);
    }

    #[test]
    fn test_format_summary() {
        let summary = result("This is a very long content that will be truncated", 0.87)
            .format_summary(20);
        assert!(summary.contains("Semantic Search"));
        assert!(summary.contains("87.00 %"));
        assert!(summary.contains("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
