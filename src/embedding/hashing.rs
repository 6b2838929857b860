// file: src/embedding/hashing.rs
// description: local deterministic feature-hashing embedder
// reference: hashed bag-of-words vectors, usable without a model server

use crate::embedding::{Embedder, check_input};
use crate::error::Result;
use crate::index::metric::normalize;
use sha2::{Digest, Sha256};

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "has",
    "have", "how", "in", "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was",
    "what", "when", "where", "which", "who", "why", "with",
];

/// Hashes each content word into one of `dimension` signed buckets and
/// L2-normalises the result. Texts sharing vocabulary score high under
/// cosine; there is no notion of synonyms. Fully deterministic.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model_id: String,
    dimension: usize,
    max_tokens: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize, max_tokens: usize) -> Self {
        Self {
            model_id: format!("hashing-v1-{}", dimension),
            dimension,
            max_tokens,
        }
    }

    fn tokenize(text: &str) -> Vec<String> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let content: Vec<String> = words
            .iter()
            .filter(|w| !STOP_WORDS.contains(&w.as_str()))
            .cloned()
            .collect();

        // A text made only of stop words still gets a non-zero vector.
        if content.is_empty() { words } else { content }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let h = u64::from_le_bytes(bytes);
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        ((h % self.dimension as u64) as usize, sign)
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        check_input(self, text)?;

        let mut vector = vec![0.0f32; self.dimension];
        for token in Self::tokenize(text) {
            let (idx, sign) = self.bucket(&token);
            vector[idx] += sign;
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn normalized(&self) -> bool {
        true
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text)
    }
}
