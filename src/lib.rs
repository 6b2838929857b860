// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod embedding;
pub mod error;
pub mod exporter;
pub mod index;
pub mod ingest;
pub mod models;
pub mod query;
pub mod store;
pub mod utils;

pub use config::{Config, EmbedderConfig, EmbedderProvider, PipelineConfig, QueryConfig, StoreConfig};
pub use embedding::{ConfiguredEmbedder, Embedder, HashingEmbedder, HttpEmbedder};
pub use error::{EmbeddingCause, ErrorKind, Result, SearchError};
pub use exporter::{ExportManifest, ExportedDocument, JsonExporter};
pub use index::{FlatIndex, IndexHandle, Metric, SimilarityIndex};
pub use models::{Document, DocumentId, Metadata, NewDocument, QueryResult, SearchHit};
pub use query::QueryRunner;
pub use store::{DocumentStore, EmbedOptions, SharedStore, StoredEmbedding};
pub use utils::{OperationTimer, Validator};
