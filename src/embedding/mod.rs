// file: src/embedding/mod.rs
// description: embedder capability, input checks and deadline handling
// reference: internal module structure

pub mod hashing;
pub mod http;

pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;

use crate::config::{EmbedderConfig, EmbedderProvider};
use crate::error::{EmbeddingCause, Result, SearchError};
use crate::utils::Validator;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for a fixed `model_id`: the same
/// text yields the same vector. Remote models that batch on the server may
/// differ in the last bits between calls and must say so on their type.
/// Empty input and input longer than `max_tokens` whitespace tokens is a
/// `Model` error; callers truncate explicitly if they want to.
pub trait Embedder: Send + Sync {
    /// Identifies the model and its version; stored next to every vector.
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn max_tokens(&self) -> usize;

    /// Whether returned vectors are unit length (cosine == dot product).
    fn normalized(&self) -> bool {
        false
    }

    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

/// Rejects input the embedder contract does not accept.
pub fn check_input<E: Embedder>(embedder: &E, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SearchError::Model("Cannot embed empty text".to_string()));
    }
    let tokens = Validator::count_tokens(text);
    if tokens > embedder.max_tokens() {
        return Err(SearchError::Model(format!(
            "Input has {} tokens, model {} accepts at most {}",
            tokens,
            embedder.model_id(),
            embedder.max_tokens()
        )));
    }
    Ok(())
}

/// Embeds `text` and verifies the result against the embedder's declared
/// dimension. With a deadline, an overrun surfaces as
/// `Embedding { cause: Timeout }`.
pub async fn embed_with_deadline<E: Embedder>(
    embedder: &E,
    text: &str,
    deadline: Option<Duration>,
) -> Result<Vec<f32>> {
    check_input(embedder, text)?;

    let vector = match deadline {
        Some(limit) => tokio::time::timeout(limit, embedder.embed(text))
            .await
            .map_err(|_| {
                debug!("Embedding exceeded deadline of {:?}", limit);
                SearchError::timeout()
            })??,
        None => embedder.embed(text).await?,
    };

    Validator::validate_vector(&vector, embedder.dimension()).map_err(|e| match e {
        SearchError::DimensionMismatch { expected, actual } => SearchError::Embedding {
            cause: EmbeddingCause::DimensionMismatch { expected, actual },
        },
        other => other,
    })?;

    Ok(vector)
}

/// Embedder selected by configuration.
pub enum ConfiguredEmbedder {
    Hashing(HashingEmbedder),
    Http(HttpEmbedder),
}

impl ConfiguredEmbedder {
    pub fn from_config(config: &EmbedderConfig) -> Result<Self> {
        match config.provider {
            EmbedderProvider::Hashing => Ok(Self::Hashing(HashingEmbedder::new(
                config.dimension,
                config.max_tokens,
            ))),
            EmbedderProvider::Http => Ok(Self::Http(HttpEmbedder::from_config(config)?)),
        }
    }

    /// Per-call deadline taken from configuration.
    pub fn deadline(config: &EmbedderConfig) -> Option<Duration> {
        config.timeout_secs.map(Duration::from_secs)
    }
}

impl Embedder for ConfiguredEmbedder {
    fn model_id(&self) -> &str {
        match self {
            Self::Hashing(e) => e.model_id(),
            Self::Http(e) => e.model_id(),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            Self::Hashing(e) => e.dimension(),
            Self::Http(e) => e.dimension(),
        }
    }

    fn max_tokens(&self) -> usize {
        match self {
            Self::Hashing(e) => e.max_tokens(),
            Self::Http(e) => e.max_tokens(),
        }
    }

    fn normalized(&self) -> bool {
        match self {
            Self::Hashing(e) => e.normalized(),
            Self::Http(e) => e.normalized(),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            Self::Hashing(e) => e.embed(text).await,
            Self::Http(e) => e.embed(text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Fixed {
        output: Vec<f32>,
        delay: Duration,
    }

    impl Embedder for Fixed {
        fn model_id(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            3
        }

        fn max_tokens(&self) -> usize {
            4
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(self.delay).await;
            Ok(self.output.clone())
        }
    }

    fn fixed(output: Vec<f32>, delay_ms: u64) -> Fixed {
        Fixed {
            output,
            delay: Duration::from_millis(delay_ms),
        }
    }

    #[tokio::test]
    async fn test_empty_and_oversized_input_rejected() {
        let e = fixed(vec![1.0, 0.0, 0.0], 0);
        let err = embed_with_deadline(&e, "  ", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);

        let err = embed_with_deadline(&e, "one two three four five", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_embedding_error() {
        let e = fixed(vec![1.0, 0.0], 0);
        let err = embed_with_deadline(&e, "hello", None).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Embedding {
                cause: EmbeddingCause::DimensionMismatch {
                    expected: 3,
                    actual: 2
                }
            }
        ));
    }

    #[tokio::test]
    async fn test_deadline_surfaces_timeout() {
        let e = fixed(vec![1.0, 0.0, 0.0], 500);
        let err = embed_with_deadline(&e, "hello", Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Embedding {
                cause: EmbeddingCause::Timeout
            }
        ));
    }

    #[tokio::test]
    async fn test_within_deadline_succeeds() {
        let e = fixed(vec![1.0, 0.0, 0.0], 0);
        let v = embed_with_deadline(&e, "hello", Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(v, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_configured_hashing_embedder() {
        let config = crate::config::Config::default_config().embedder;
        let embedder = ConfiguredEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.dimension(), config.dimension);
        assert!(embedder.normalized());
        let v = tokio_test::block_on(embedder.embed("similarity search")).unwrap();
        assert_eq!(v.len(), config.dimension);
    }
}
