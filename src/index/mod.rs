// file: src/index/mod.rs
// description: similarity index module exports
// reference: internal module structure

pub mod flat;
pub mod handle;
pub mod metric;

pub use flat::FlatIndex;
pub use handle::IndexHandle;
pub use metric::Metric;

use crate::error::Result;
use crate::models::SearchHit;

/// Nearest-neighbour lookup over embedding vectors.
///
/// `FlatIndex` is the exact reference; any approximate implementation must
/// agree with it on ordering semantics: at most `k` hits, best first, ties
/// by insertion order, empty result for an empty index.
pub trait SimilarityIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    /// `None` until at least one vector has been indexed.
    fn dimension(&self) -> Option<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store generation this index was built from.
    fn generation(&self) -> u64;
}
