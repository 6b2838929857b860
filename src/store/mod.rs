// file: src/store/mod.rs
// description: document store and snapshot persistence exports
// reference: internal module structure

pub mod document_store;
pub mod snapshot;

pub use document_store::{DocumentStore, EmbedOptions, StoredEmbedding};
pub use snapshot::FORMAT_VERSION;

use parking_lot::Mutex;
use std::sync::Arc;

/// A store shared between writer threads. Id assignment and embedding
/// storage require `&mut DocumentStore`, so writers serialize on the lock.
pub type SharedStore = Arc<Mutex<DocumentStore>>;

pub fn shared(store: DocumentStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}
