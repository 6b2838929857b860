// file: src/exporter/json.rs
// description: json export of the document table

use crate::error::{Result, SearchError};
use crate::models::{Document, DocumentId};
use crate::store::DocumentStore;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

/// A document as exported: vectors are left out, only their provenance is kept.
#[derive(Debug, Serialize)]
pub struct ExportedDocument {
    #[serde(flatten)]
    pub document: Document,
    pub embedding_model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub total_documents: usize,
    pub embedded_documents: usize,
    pub dimension: Option<usize>,
    pub files: Vec<String>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| SearchError::io(&output_dir, e))?;
        Ok(Self { output_dir })
    }

    fn exported(store: &DocumentStore, document: &Document) -> ExportedDocument {
        ExportedDocument {
            document: document.clone(),
            embedding_model: store.embedding(document.id).map(|e| e.model.clone()),
        }
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T, pretty: bool) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        let body = if pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        fs::write(&path, body).map_err(|e| SearchError::io(&path, e))?;
        Ok(path)
    }

    pub fn export_all(&self, store: &DocumentStore, pretty: bool) -> Result<ExportManifest> {
        info!("Starting JSON export to {:?}", self.output_dir);

        let documents: Vec<ExportedDocument> = store
            .documents()
            .map(|doc| Self::exported(store, doc))
            .collect();
        let documents_path = self.write_json("documents.json", &documents, pretty)?;

        let manifest = ExportManifest {
            exported_at: Utc::now().to_rfc3339(),
            total_documents: documents.len(),
            embedded_documents: store.embedded_count(),
            dimension: store.dimension(),
            files: vec![file_name(&documents_path)],
        };
        self.write_json("manifest.json", &manifest, pretty)?;

        info!(
            "Export complete: {} documents exported",
            manifest.total_documents
        );
        Ok(manifest)
    }

    pub fn export_single(
        &self,
        store: &DocumentStore,
        id: DocumentId,
        pretty: bool,
    ) -> Result<PathBuf> {
        let document = store.get(id)?;
        let path = self.write_json(
            &format!("document-{}.json", id),
            &Self::exported(store, document),
            pretty,
        )?;
        info!("Exported document {} to {}", id, path.display());
        Ok(path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::index::Metric;
    use crate::models::NewDocument;
    use tempfile::tempdir;

    fn store() -> DocumentStore {
        let mut store = DocumentStore::new(Metric::Cosine);
        store
            .write(vec![
                NewDocument::new("first").with_meta("title", "One"),
                NewDocument::new("second"),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_export_all() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();
        let manifest = exporter.export_all(&store(), true).unwrap();

        assert_eq!(manifest.total_documents, 2);
        assert_eq!(manifest.files, vec!["documents.json".to_string()]);

        let raw = fs::read_to_string(dir.path().join("documents.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed[0]["meta"]["title"], "One");
        assert_eq!(parsed[1]["id"], 1);
        assert!(parsed[1]["embedding_model"].is_null());
        assert!(dir.path().join("manifest.json").exists());
    }

    #[test]
    fn test_export_single() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();
        let store = store();

        let path = exporter.export_single(&store, DocumentId(0), false).unwrap();
        assert!(path.ends_with("document-0.json"));

        let err = exporter
            .export_single(&store, DocumentId(7), false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
