// file: src/index/handle.rs
// description: published index with swap-on-completion rebuilds

use crate::error::Result;
use crate::index::{FlatIndex, Metric, SimilarityIndex};
use crate::models::SearchHit;
use crate::store::DocumentStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Shares one immutable index between concurrent searchers. A rebuild
/// constructs a complete new index off to the side and then replaces the
/// published pointer, so a search sees either the old or the new index and
/// never a partially built one.
pub struct IndexHandle {
    current: RwLock<Arc<FlatIndex>>,
}

impl IndexHandle {
    pub fn new(index: FlatIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// The currently published index. Holding the returned `Arc` pins it even
    /// if a newer index is published meanwhile.
    pub fn current(&self) -> Arc<FlatIndex> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the published index and returns the previous one.
    pub fn publish(&self, index: FlatIndex) -> Arc<FlatIndex> {
        let next = Arc::new(index);
        std::mem::replace(&mut *self.current.write(), next)
    }

    pub fn rebuild(&self, store: &DocumentStore, metric: Metric) -> Result<()> {
        let index = FlatIndex::from_store(store, metric)?;
        info!(
            "Publishing {} index over {} vectors (generation {})",
            metric,
            index.len(),
            index.generation()
        );
        self.publish(index);
        Ok(())
    }

    /// True when the store has changed since the published index was built.
    pub fn is_stale(&self, store: &DocumentStore) -> bool {
        let stale = self.current().generation() < store.generation();
        if stale {
            warn!(
                "Index generation {} predates store generation {}",
                self.current().generation(),
                store.generation()
            );
        }
        stale
    }
}

impl SimilarityIndex for IndexHandle {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.current().search(query, k)
    }

    fn dimension(&self) -> Option<usize> {
        self.current().dimension()
    }

    fn len(&self) -> usize {
        self.current().len()
    }

    fn generation(&self) -> u64 {
        self.current().generation()
    }
}
