// file: src/embedding/http.rs
// description: OpenAI-compatible embeddings endpoint client
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::EmbedderConfig;
use crate::embedding::{Embedder, check_input};
use crate::error::{EmbeddingCause, Result, SearchError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Remote embedder. Servers that batch requests may return vectors that
/// differ in the last float bits for identical input; scores compared
/// across calls should allow for ~1e-6 drift.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    max_tokens: usize,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        dimension: usize,
        max_tokens: usize,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SearchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            dimension,
            max_tokens,
        })
    }

    pub fn from_config(config: &EmbedderConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            SearchError::Config("embedder.endpoint is required for the http provider".to_string())
        })?;

        Self::new(
            endpoint,
            config.api_key.clone(),
            config.model.clone(),
            config.dimension,
            config.max_tokens,
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    fn request_error(e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Embedding {
                cause: EmbeddingCause::Timeout,
            }
        } else {
            SearchError::Model(format!("Embedding request failed: {}", e))
        }
    }
}

impl Embedder for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        check_input(self, text)?;

        let request = EmbeddingRequest {
            input: vec![text],
            model: &self.model,
        };

        debug!(
            "Requesting embedding from {} for {} chars",
            self.endpoint,
            text.len()
        );

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(Self::request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SearchError::Model(format!(
                "Embedding endpoint returned {}: {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(Self::request_error)?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| SearchError::Model("No embedding data returned".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(SearchError::Embedding {
                cause: EmbeddingCause::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                },
            });
        }

        debug!("Received embedding of dimension {}", embedding.len());
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response, or holds the connection open.
    async fn serve_once(body: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;
            match body {
                Some(body) => {
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                }
                None => tokio::time::sleep(Duration::from_secs(5)).await,
            }
        });

        format!("http://{}/v1/embeddings", addr)
    }

    fn embedder(endpoint: String, dimension: usize, timeout_ms: u64) -> HttpEmbedder {
        HttpEmbedder::new(
            endpoint,
            Some("test-key".to_string()),
            "test-model".to_string(),
            dimension,
            512,
            Some(Duration::from_millis(timeout_ms)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_parses_embedding_response() {
        let endpoint = serve_once(Some(r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#)).await;
        let e = embedder(endpoint, 3, 2_000);
        let v = e.embed("What is Faiss?").await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_dimension_checked() {
        let endpoint = serve_once(Some(r#"{"data":[{"embedding":[0.1,0.2]}]}"#)).await;
        let e = embedder(endpoint, 3, 2_000);
        let err = e.embed("What is Faiss?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_embedding_timeout() {
        let endpoint = serve_once(None).await;
        let e = embedder(endpoint, 3, 100);
        let err = e.embed("What is Faiss?").await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Embedding {
                cause: EmbeddingCause::Timeout
            }
        ));
    }

    #[test]
    fn test_endpoint_required() {
        let mut config = crate::config::Config::default_config().embedder;
        config.endpoint = None;
        assert!(HttpEmbedder::from_config(&config).is_err());
    }
}
