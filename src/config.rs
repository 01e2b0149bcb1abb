//! TOML configuration parsing and validation.
//!
//! Every collaborator the service talks to (embedding model, generation
//! model, vector index, result cache, SQLite content store) is selected and
//! tuned here. The configuration is loaded once at process start and turned
//! into a [`CurriculumService`](crate::service::CurriculumService).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_environment")]
    pub environment: String,
    pub db: DbConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

fn default_environment() -> String {
    "production".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            max_retries: 0,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: None,
            max_retries: 0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorConfig {
    #[serde(default = "default_vector_provider")]
    pub provider: String,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            provider: default_vector_provider(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
/// Transport retries are opt-in; a failed call surfaces immediately by default.
fn default_max_retries() -> u32 {
    0
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_generation_timeout_secs() -> u64 {
    60
}
fn default_vector_provider() -> String {
    "sqlite".to_string()
}
fn default_cache_backend() -> String {
    "memory".to_string()
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_max_entries() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Config {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    match config.environment.as_str() {
        "development" | "production" => {}
        other => anyhow::bail!(
            "Unknown environment: '{}'. Must be development or production.",
            other
        ),
    }

    // Embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    // Generation
    match config.generation.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }
    if config.generation.is_enabled() && config.generation.model.is_none() {
        anyhow::bail!(
            "generation.model must be specified when provider is '{}'",
            config.generation.provider
        );
    }

    // Vector index
    match config.vector.provider.as_str() {
        "sqlite" | "disabled" => {}
        "synthetic" => {
            if !config.is_development() {
                anyhow::bail!(
                    "vector.provider = 'synthetic' is only allowed when environment = 'development'"
                );
            }
        }
        other => anyhow::bail!(
            "Unknown vector provider: '{}'. Must be sqlite, synthetic, or disabled.",
            other
        ),
    }

    // Cache
    match config.cache.backend.as_str() {
        "memory" | "sqlite" => {}
        other => anyhow::bail!(
            "Unknown cache backend: '{}'. Must be memory or sqlite.",
            other
        ),
    }
    if config.cache.ttl_secs == 0 {
        anyhow::bail!("cache.ttl_secs must be > 0");
    }
    if config.cache.max_entries == 0 {
        anyhow::bail!("cache.max_entries must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let content = format!(
            r#"
{}

[db]
path = "/tmp/tutor.sqlite"

[server]
bind = "127.0.0.1:0"
"#,
            extra
        );
        let config: Config = toml::from_str(&content)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.environment, "production");
        assert_eq!(cfg.vector.provider, "sqlite");
        assert_eq!(cfg.cache.backend, "memory");
        assert_eq!(cfg.cache.ttl_secs, 3600);
        assert!(!cfg.embedding.is_enabled());
        assert!(!cfg.generation.is_enabled());
        assert_eq!(cfg.embedding.max_retries, 0);
        assert_eq!(cfg.generation.max_retries, 0);
    }

    #[test]
    fn test_synthetic_requires_development() {
        let err = parse("environment = \"production\"\n[vector]\nprovider = \"synthetic\"")
            .unwrap_err();
        assert!(err.to_string().contains("development"));

        let cfg = parse("environment = \"development\"\n[vector]\nprovider = \"synthetic\"")
            .unwrap();
        assert!(cfg.is_development());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(parse("[cache]\nttl_secs = 0").is_err());
    }

    #[test]
    fn test_embedding_requires_model_and_dims() {
        assert!(parse("[embedding]\nprovider = \"openai\"\nmodel = \"m\"").is_err());
        assert!(parse("[embedding]\nprovider = \"openai\"\ndims = 8").is_err());
        assert!(parse("[embedding]\nprovider = \"ollama\"\nmodel = \"m\"\ndims = 8").is_ok());
    }

    #[test]
    fn test_unknown_generation_provider() {
        let err = parse("[generation]\nprovider = \"bard\"").unwrap_err();
        assert!(err.to_string().contains("Unknown generation provider"));
    }

    #[test]
    fn test_example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/tutor.example.toml");
        let cfg = load_config(&path).unwrap();
        assert!(cfg.embedding.is_enabled());
        assert_eq!(cfg.embedding.dims, Some(1536));
        assert_eq!(cfg.server.bind, "127.0.0.1:8787");
    }
}
