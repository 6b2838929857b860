// file: src/store/document_store.rs
// description: owns documents and their embeddings; write, embed, persist
// reference: batch insertion with per-item failure reporting

use crate::embedding::{Embedder, embed_with_deadline};
use crate::error::{EmbeddingCause, Result, SearchError};
use crate::index::Metric;
use crate::models::{Document, DocumentId, Metadata, NewDocument};
use crate::store::snapshot;
use crate::utils::Validator;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A vector together with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub model: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Recompute every embedding, not only missing or outdated ones.
    pub force: bool,
    pub parallel_workers: usize,
    pub deadline: Option<Duration>,
    /// Embed only the first `max_tokens` tokens of over-long documents.
    pub truncate_input: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            force: false,
            parallel_workers: 4,
            deadline: None,
            truncate_input: false,
        }
    }
}

/// Every embedding in the store has the same dimension; `dimension` is set
/// by the first stored vector and cleared only by `reset`.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pub(crate) documents: BTreeMap<DocumentId, Document>,
    pub(crate) embeddings: BTreeMap<DocumentId, StoredEmbedding>,
    pub(crate) dimension: Option<usize>,
    pub(crate) metric: Metric,
    pub(crate) next_id: u64,
    pub(crate) generation: u64,
}

impl DocumentStore {
    pub fn new(metric: Metric) -> Self {
        Self {
            documents: BTreeMap::new(),
            embeddings: BTreeMap::new(),
            dimension: None,
            metric,
            next_id: 0,
            generation: 0,
        }
    }

    /// Validates every document before inserting any of them, so a rejected
    /// batch leaves the store untouched.
    pub fn write(&mut self, documents: Vec<NewDocument>) -> Result<Vec<DocumentId>> {
        for (pos, doc) in documents.iter().enumerate() {
            doc.validate().map_err(|e| match e {
                SearchError::Validation(msg) => {
                    SearchError::Validation(format!("document {} in batch: {}", pos, msg))
                }
                other => other,
            })?;
        }

        let mut ids = Vec::with_capacity(documents.len());
        for doc in documents {
            let id = DocumentId(self.next_id);
            self.next_id += 1;
            self.documents.insert(id, Document::from_new(id, doc));
            ids.push(id);
        }

        if !ids.is_empty() {
            self.generation += 1;
            info!("Wrote {} document(s)", ids.len());
        }
        Ok(ids)
    }

    pub fn get(&self, id: DocumentId) -> Result<&Document> {
        self.documents.get(&id).ok_or(SearchError::NotFound(id))
    }

    /// Metadata is the only mutable part of a document; embeddings stay valid.
    pub fn update_metadata(&mut self, id: DocumentId, meta: Metadata) -> Result<()> {
        Validator::validate_metadata(&meta)?;
        let doc = self
            .documents
            .get_mut(&id)
            .ok_or(SearchError::NotFound(id))?;
        doc.meta = meta;
        Ok(())
    }

    /// Ids whose embedding is missing or was produced by another model.
    pub fn pending_ids(&self, model_id: &str, force: bool) -> Vec<DocumentId> {
        self.documents
            .keys()
            .filter(|id| {
                force
                    || self
                        .embeddings
                        .get(id)
                        .is_none_or(|stored| stored.model != model_id)
            })
            .copied()
            .collect()
    }

    /// Embeds every pending document. Vectors that were computed are kept
    /// even when others fail; the failures are reported together as
    /// `EmbeddingBatch`. Running again with nothing pending does no work.
    pub async fn update_embeddings<E: Embedder>(
        &mut self,
        embedder: &E,
        options: &EmbedOptions,
    ) -> Result<usize> {
        let expected = embedder.dimension();
        if let Some(dim) = self.dimension {
            if dim != expected {
                return Err(SearchError::Embedding {
                    cause: EmbeddingCause::DimensionMismatch {
                        expected: dim,
                        actual: expected,
                    },
                });
            }
        }

        let pending = self.pending_ids(embedder.model_id(), options.force);
        if pending.is_empty() {
            debug!("All {} document(s) already embedded", self.documents.len());
            return Ok(0);
        }

        info!(
            "Embedding {} document(s) with {} ({} workers)",
            pending.len(),
            embedder.model_id(),
            options.parallel_workers
        );

        let max_tokens = embedder.max_tokens();
        let inputs: Vec<(DocumentId, String)> = pending
            .into_iter()
            .filter_map(|id| self.documents.get(&id).map(|d| (id, &d.content)))
            .map(|(id, content)| {
                if options.truncate_input && Validator::count_tokens(content) > max_tokens {
                    debug!("Truncating document {} to {} tokens", id, max_tokens);
                    (id, Validator::truncate_to_tokens(content, max_tokens))
                } else {
                    (id, content.clone())
                }
            })
            .collect();

        let mut results = stream::iter(inputs.into_iter().map(|(id, text)| async move {
            let result = embed_with_deadline(embedder, &text, options.deadline).await;
            (id, result)
        }))
        .buffer_unordered(options.parallel_workers.max(1))
        .collect::<Vec<_>>()
        .await;

        results.sort_by_key(|(id, _)| *id);

        let model = embedder.model_id().to_string();
        let mut stored = 0;
        let mut failures = Vec::new();

        for (id, result) in results {
            match result {
                Ok(vector) => {
                    self.embeddings.insert(
                        id,
                        StoredEmbedding {
                            model: model.clone(),
                            vector,
                        },
                    );
                    self.dimension = Some(expected);
                    stored += 1;
                }
                Err(e) => {
                    warn!("Failed to embed document {}: {}", id, e);
                    failures.push((id, e.into_embedding_cause()));
                }
            }
        }

        if stored > 0 {
            self.generation += 1;
        }

        if failures.is_empty() {
            info!("Stored {} embedding(s)", stored);
            Ok(stored)
        } else {
            Err(SearchError::EmbeddingBatch { stored, failures })
        }
    }

    /// Drops every document and embedding. Ids restart from zero.
    pub fn reset(&mut self) {
        warn!(
            "Resetting document store ({} documents)",
            self.documents.len()
        );
        self.documents.clear();
        self.embeddings.clear();
        self.dimension = None;
        self.next_id = 0;
        self.generation += 1;
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        snapshot::write(self, path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        snapshot::read(path)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Embeddings in id (insertion) order.
    pub fn embeddings(&self) -> impl Iterator<Item = (DocumentId, &StoredEmbedding)> {
        self.embeddings.iter().map(|(id, e)| (*id, e))
    }

    pub fn embedding(&self, id: DocumentId) -> Option<&StoredEmbedding> {
        self.embeddings.get(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn embedded_count(&self) -> usize {
        self.embeddings.len()
    }

    pub fn pending_count(&self) -> usize {
        self.documents.len() - self.embeddings.len()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Bumped by every mutation that changes what an index should contain.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
