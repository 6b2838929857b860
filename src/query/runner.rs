// file: src/query/runner.rs
// description: embeds query text, searches the index and resolves documents

use crate::embedding::{Embedder, embed_with_deadline};
use crate::error::{Result, SearchError};
use crate::index::SimilarityIndex;
use crate::models::QueryResult;
use crate::store::DocumentStore;
use crate::utils::Validator;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct QueryRunner {
    deadline: Option<Duration>,
    truncate_input: bool,
}

impl QueryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Cut query text to the embedder's token limit instead of failing.
    pub fn with_truncation(mut self, truncate: bool) -> Self {
        self.truncate_input = truncate;
        self
    }

    /// Returns up to `k` documents, best first. Embedder and index errors are
    /// propagated. A hit whose id is missing from `store` is dropped and
    /// logged, since it only means the index and store have drifted apart.
    pub async fn run<E, I>(
        &self,
        query_text: &str,
        embedder: &E,
        store: &DocumentStore,
        index: &I,
        k: usize,
    ) -> Result<Vec<QueryResult>>
    where
        E: Embedder,
        I: SimilarityIndex + ?Sized,
    {
        Validator::validate_top_k(k)?;

        if index.generation() < store.generation() {
            warn!(
                "Index (generation {}) predates the document store (generation {}); results may be incomplete",
                index.generation(),
                store.generation()
            );
        }

        let text = if self.truncate_input
            && Validator::count_tokens(query_text) > embedder.max_tokens()
        {
            debug!("Truncating query to {} tokens", embedder.max_tokens());
            Validator::truncate_to_tokens(query_text, embedder.max_tokens())
        } else {
            query_text.to_string()
        };

        let query_vector = embed_with_deadline(embedder, &text, self.deadline).await?;
        let hits = index.search(&query_vector, k)?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            match store.get(hit.id) {
                Ok(document) => results.push(QueryResult::new(document.clone(), hit.score)),
                Err(SearchError::NotFound(id)) => {
                    warn!("Index returned document {} which is not in the store; skipping", id);
                }
                Err(e) => return Err(e),
            }
        }

        info!("Query returned {} result(s)", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::error::ErrorKind;
    use crate::index::{FlatIndex, Metric};
    use crate::models::{DocumentId, NewDocument};
    use crate::store::EmbedOptions;

    async fn indexed_store(contents: &[&str]) -> (DocumentStore, HashingEmbedder) {
        let embedder = HashingEmbedder::new(256, 64);
        let mut store = DocumentStore::new(Metric::Cosine);
        store
            .write(contents.iter().map(|c| NewDocument::new(*c)).collect())
            .unwrap();
        store
            .update_embeddings(&embedder, &EmbedOptions::default())
            .await
            .unwrap();
        (store, embedder)
    }

    #[tokio::test]
    async fn test_dangling_ids_are_dropped() {
        let (store, embedder) = indexed_store(&["vector similarity search"]).await;

        let mut vectors: Vec<(DocumentId, Vec<f32>)> = store
            .embeddings()
            .map(|(id, e)| (id, e.vector.clone()))
            .collect();
        let ghost = embedder.embed_text("vector similarity").unwrap();
        vectors.push((DocumentId(99), ghost));
        let index = FlatIndex::build(vectors, Metric::Cosine).unwrap();

        let results = QueryRunner::new()
            .run("vector similarity search", &embedder, &store, &index, 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, DocumentId(0));
    }

    #[tokio::test]
    async fn test_embedder_errors_propagate() {
        let (store, embedder) = indexed_store(&["vector search"]).await;
        let index = FlatIndex::from_store(&store, Metric::Cosine).unwrap();

        let err = QueryRunner::new()
            .run("   ", &embedder, &store, &index, 3)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_propagates() {
        let (store, _) = indexed_store(&["vector search"]).await;
        let index = FlatIndex::from_store(&store, Metric::Cosine).unwrap();
        let other = HashingEmbedder::new(128, 64);

        let err = QueryRunner::new()
            .run("vector", &other, &store, &index, 3)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[tokio::test]
    async fn test_truncation_is_opt_in() {
        let (store, embedder) = indexed_store(&["vector search"]).await;
        let index = FlatIndex::from_store(&store, Metric::Cosine).unwrap();
        let long_query = vec!["vector"; 100].join(" ");

        let err = QueryRunner::new()
            .run(&long_query, &embedder, &store, &index, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);

        let results = QueryRunner::new()
            .with_truncation(true)
            .run(&long_query, &embedder, &store, &index, 1)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_index_still_answers() {
        let (mut store, embedder) = indexed_store(&["vector search"]).await;
        let index = FlatIndex::from_store(&store, Metric::Cosine).unwrap();
        store
            .write(vec![NewDocument::new("not yet indexed")])
            .unwrap();
        assert!(index.generation() < store.generation());

        let results = QueryRunner::new()
            .run("vector search", &embedder, &store, &index, 3)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
