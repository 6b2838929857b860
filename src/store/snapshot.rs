// file: src/store/snapshot.rs
// description: versioned, checksummed snapshot container for the document store
// reference: atomic write-then-rename persistence

//! Snapshot layout:
//!
//! ```text
//! SEMSNAP <format_version> sha256:<hex digest of payload>\n
//! <payload: JSON {header, documents, embeddings}>
//! ```
//!
//! The index itself is not stored; it is rebuilt from the embedding table on
//! load, which needs no re-embedding.

use crate::error::{Result, SearchError};
use crate::index::Metric;
use crate::models::{Document, DocumentId};
use crate::store::{DocumentStore, StoredEmbedding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const MAGIC: &str = "SEMSNAP";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    format_version: u32,
    dimension: Option<usize>,
    metric: Metric,
    document_count: usize,
    next_id: u64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingRow {
    id: DocumentId,
    model: String,
    vector: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    header: Header,
    documents: Vec<Document>,
    embeddings: Vec<EmbeddingRow>,
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn corrupt(msg: impl Into<String>) -> SearchError {
    SearchError::CorruptSnapshot(msg.into())
}

pub fn encode(store: &DocumentStore) -> Result<Vec<u8>> {
    let payload = Payload {
        header: Header {
            format_version: FORMAT_VERSION,
            dimension: store.dimension,
            metric: store.metric,
            document_count: store.documents.len(),
            next_id: store.next_id,
            created_at: Utc::now(),
        },
        documents: store.documents.values().cloned().collect(),
        embeddings: store
            .embeddings
            .iter()
            .map(|(id, e)| EmbeddingRow {
                id: *id,
                model: e.model.clone(),
                vector: e.vector.clone(),
            })
            .collect(),
    };

    let body = serde_json::to_vec(&payload)?;
    let mut out = format!("{} {} sha256:{}\n", MAGIC, FORMAT_VERSION, checksum(&body)).into_bytes();
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<DocumentStore> {
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| corrupt("missing header line"))?;
    let header_line =
        std::str::from_utf8(&bytes[..newline]).map_err(|_| corrupt("header is not UTF-8"))?;
    let body = &bytes[newline + 1..];

    let mut parts = header_line.split(' ');
    if parts.next() != Some(MAGIC) {
        return Err(corrupt("not a snapshot file"));
    }
    let version: u32 = parts
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| corrupt("unreadable format version"))?;
    if version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "format version {} is not supported (expected {})",
            version, FORMAT_VERSION
        )));
    }
    let expected = parts
        .next()
        .and_then(|c| c.strip_prefix("sha256:"))
        .ok_or_else(|| corrupt("missing checksum"))?;
    if checksum(body) != expected {
        return Err(corrupt("checksum mismatch"));
    }

    let payload: Payload =
        serde_json::from_slice(body).map_err(|e| corrupt(format!("invalid payload: {}", e)))?;
    from_payload(payload)
}

fn from_payload(payload: Payload) -> Result<DocumentStore> {
    let header = payload.header;
    if header.format_version != FORMAT_VERSION {
        return Err(corrupt("payload version disagrees with header line"));
    }
    if header.document_count != payload.documents.len() {
        return Err(corrupt(format!(
            "header lists {} documents, found {}",
            header.document_count,
            payload.documents.len()
        )));
    }

    let mut documents = BTreeMap::new();
    for doc in payload.documents {
        if doc.id.0 >= header.next_id {
            return Err(corrupt(format!("document id {} beyond next_id", doc.id)));
        }
        if documents.insert(doc.id, doc).is_some() {
            return Err(corrupt("duplicate document id"));
        }
    }

    let mut embeddings = BTreeMap::new();
    let mut seen = HashSet::new();
    for row in payload.embeddings {
        if !documents.contains_key(&row.id) {
            return Err(corrupt(format!("embedding for unknown document {}", row.id)));
        }
        if !seen.insert(row.id) {
            return Err(corrupt(format!("duplicate embedding for {}", row.id)));
        }
        if Some(row.vector.len()) != header.dimension {
            return Err(corrupt(format!(
                "embedding {} has dimension {}, header says {:?}",
                row.id,
                row.vector.len(),
                header.dimension
            )));
        }
        embeddings.insert(
            row.id,
            StoredEmbedding {
                model: row.model,
                vector: row.vector,
            },
        );
    }

    Ok(DocumentStore {
        documents,
        embeddings,
        dimension: header.dimension,
        metric: header.metric,
        next_id: header.next_id,
        generation: 0,
    })
}

/// Writes to a temporary file in the target directory, then renames it over
/// `path`. A failure at any step leaves an existing snapshot untouched.
pub fn write(store: &DocumentStore, path: &Path) -> Result<()> {
    let bytes = encode(store)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| SearchError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SearchError::io(dir, e))?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SearchError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| SearchError::io(path, e.error))?;

    info!(
        "Saved snapshot with {} documents ({} bytes) to {}",
        store.documents.len(),
        bytes.len(),
        path.display()
    );
    Ok(())
}

pub fn read(path: &Path) -> Result<DocumentStore> {
    let bytes = fs::read(path).map_err(|e| SearchError::io(path, e))?;
    let store = decode(&bytes)?;
    debug!(
        "Loaded snapshot {} ({} documents, {} embeddings)",
        path.display(),
        store.documents.len(),
        store.embeddings.len()
    );
    Ok(store)
}
