use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub aggregate: AggregateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MongoConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub uri: String,
    /// Database assumed when a request names none and inference fails.
    #[serde(default)]
    pub default_db: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Shared secret expected in the `X-API-Key` header on `/aggregate`.
    pub api_key: String,
}

fn default_bind() -> String {
    "127.0.0.1:7399".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchemaConfig {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
        }
    }
}

fn default_sample_size() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AggregateConfig {
    /// Maximum result documents returned per aggregation; 0 means unbounded.
    #[serde(default)]
    pub result_limit: usize,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.mongodb.uri.trim().is_empty() {
        anyhow::bail!("mongodb.uri must not be empty");
    }

    if config.server.api_key.trim().is_empty() {
        anyhow::bail!("server.api_key must not be empty");
    }

    if config.schema.sample_size == 0 {
        anyhow::bail!("schema.sample_size must be > 0");
    }

    Ok(config)
}
