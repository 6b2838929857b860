// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, SearchError};
use crate::index::Metric;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreConfig,
    pub embedder: EmbedderConfig,
    pub query: QueryConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub snapshot_path: PathBuf,
    #[serde(default)]
    pub metric: Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    Hashing,
    Http,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedderConfig {
    pub provider: EmbedderProvider,
    pub model: String,
    pub dimension: usize,
    pub max_tokens: usize,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Truncate over-long input to `max_tokens` instead of rejecting it.
    #[serde(default)]
    pub truncate_input: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub parallel_workers: usize,
    #[serde(default)]
    pub force_reembed: bool,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SEMANTIC_SEARCH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| SearchError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| SearchError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            store: StoreConfig {
                snapshot_path: PathBuf::from("data/index.snapshot"),
                metric: Metric::Cosine,
            },
            embedder: EmbedderConfig {
                provider: EmbedderProvider::Hashing,
                model: "hashing-v1".to_string(),
                dimension: 384,
                max_tokens: 512,
                endpoint: None,
                api_key: None,
                timeout_secs: Some(30),
                truncate_input: false,
            },
            query: QueryConfig { top_k: 3 },
            pipeline: PipelineConfig {
                parallel_workers: 4,
                force_reembed: false,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedder.dimension == 0 {
            return Err(SearchError::Config(
                "embedder.dimension must be greater than 0".to_string(),
            ));
        }

        if self.embedder.max_tokens == 0 {
            return Err(SearchError::Config(
                "embedder.max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.embedder.provider == EmbedderProvider::Http && self.embedder.endpoint.is_none() {
            return Err(SearchError::Config(
                "embedder.endpoint is required for the http provider".to_string(),
            ));
        }

        if self.query.top_k == 0 {
            return Err(SearchError::Config(
                "query.top_k must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.parallel_workers == 0 {
            return Err(SearchError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
