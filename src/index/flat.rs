// file: src/index/flat.rs
// description: brute-force exact nearest-neighbour index
// reference: exact k-NN baseline for approximate index implementations

use crate::error::{Result, SearchError};
use crate::index::SimilarityIndex;
use crate::index::metric::{Metric, l2_norm};
use crate::models::{DocumentId, SearchHit};
use crate::store::DocumentStore;
use crate::utils::Validator;
use std::cmp::Ordering;
use tracing::debug;

struct Entry {
    id: DocumentId,
    vector: Vec<f32>,
    norm: f32,
}

/// Exact index over every stored vector. Build is O(n·d), search is O(n·d)
/// plus a sort of the scored candidates.
pub struct FlatIndex {
    metric: Metric,
    dimension: Option<usize>,
    entries: Vec<Entry>,
    generation: u64,
}

impl FlatIndex {
    pub fn empty(metric: Metric) -> Self {
        Self {
            metric,
            dimension: None,
            entries: Vec::new(),
            generation: 0,
        }
    }

    /// Builds from `(id, vector)` pairs. Entries are kept in id order, which is
    /// insertion order, so ties resolve to the earliest-inserted document.
    pub fn build<I>(vectors: I, metric: Metric) -> Result<Self>
    where
        I: IntoIterator<Item = (DocumentId, Vec<f32>)>,
    {
        let mut entries: Vec<Entry> = vectors
            .into_iter()
            .map(|(id, vector)| {
                let norm = l2_norm(&vector);
                Entry { id, vector, norm }
            })
            .collect();
        entries.sort_by_key(|e| e.id);

        if let Some(pair) = entries.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(SearchError::Validation(format!(
                "Duplicate vector for document {}",
                pair[0].id
            )));
        }

        let dimension = entries.first().map(|e| e.vector.len());
        if let Some(dim) = dimension {
            for entry in &entries {
                Validator::validate_vector(&entry.vector, dim)?;
            }
        }

        debug!(
            "Built {} index over {} vectors (dimension {:?})",
            metric,
            entries.len(),
            dimension
        );

        Ok(Self {
            metric,
            dimension,
            entries,
            generation: 0,
        })
    }

    /// Builds over every embedding currently held by `store` and records the
    /// store generation it reflects.
    pub fn from_store(store: &DocumentStore, metric: Metric) -> Result<Self> {
        let vectors = store
            .embeddings()
            .map(|(id, embedding)| (id, embedding.vector.clone()));
        let mut index = Self::build(vectors, metric)?;
        index.generation = store.generation();
        Ok(index)
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    /// Scores every entry against `query` in insertion order.
    pub fn score_all(&self, query: &[f32]) -> Result<Vec<SearchHit>> {
        let Some(dim) = self.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(SearchError::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }

        let query_norm = l2_norm(query);
        Ok(self
            .entries
            .iter()
            .map(|entry| SearchHit {
                id: entry.id,
                score: self
                    .metric
                    .score(query, query_norm, &entry.vector, entry.norm),
            })
            .collect())
    }
}

impl SimilarityIndex for FlatIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        Validator::validate_top_k(k)?;

        // score_all yields insertion order, and the sort is stable, so equal
        // scores keep the earliest-inserted id first.
        let mut hits = self.score_all(query)?;
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}
