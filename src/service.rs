//! The service object every operation runs against.
//!
//! [`CurriculumService`] owns one handle per collaborator and carries no
//! other mutable state; the four operations ([`search`](CurriculumService::search),
//! [`fetch`](CurriculumService::fetch), [`generate`](CurriculumService::generate),
//! [`validate`](CurriculumService::validate)) are implemented in their own
//! modules as `impl` blocks on this type.
//!
//! Build it once at process start with [`CurriculumService::from_config`]
//! and share it behind an `Arc`, or assemble it from test doubles with
//! [`CurriculumService::new`].

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::create_cache;
use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::generation::create_generator;
use crate::store::SqliteContentStore;
use crate::traits::{ContentStore, EmbeddingClient, GenerationClient, ResultCache, VectorIndex};
use crate::vector::create_vector_index;

/// Tunables that are not collaborators.
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    /// TTL applied to freshly computed search results.
    pub cache_ttl: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Injected collaborators for one service instance.
#[derive(Clone)]
pub struct Collaborators {
    pub embedder: Arc<dyn EmbeddingClient>,
    pub generator: Arc<dyn GenerationClient>,
    pub index: Arc<dyn VectorIndex>,
    pub store: Arc<dyn ContentStore>,
    pub cache: Arc<dyn ResultCache>,
}

#[derive(Clone)]
pub struct CurriculumService {
    pub(crate) embedder: Arc<dyn EmbeddingClient>,
    pub(crate) generator: Arc<dyn GenerationClient>,
    pub(crate) index: Arc<dyn VectorIndex>,
    pub(crate) store: Arc<dyn ContentStore>,
    pub(crate) cache: Arc<dyn ResultCache>,
    pub(crate) settings: ServiceSettings,
}

impl CurriculumService {
    pub fn new(collaborators: Collaborators, settings: ServiceSettings) -> Self {
        Self {
            embedder: collaborators.embedder,
            generator: collaborators.generator,
            index: collaborators.index,
            store: collaborators.store,
            cache: collaborators.cache,
            settings,
        }
    }

    /// Connects to SQLite and instantiates every collaborator named in `config`.
    ///
    /// The schema must already exist (`tutor init`).
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;

        let collaborators = Collaborators {
            embedder: create_embedder(&config.embedding)?,
            generator: create_generator(&config.generation)?,
            index: create_vector_index(config, pool.clone())?,
            store: Arc::new(SqliteContentStore::new(pool.clone())),
            cache: create_cache(&config.cache, pool)?,
        };

        tracing::info!(
            embedding = collaborators.embedder.model_name(),
            generation = collaborators.generator.model_name(),
            vector = collaborators.index.name(),
            cache = %config.cache.backend,
            "service initialised"
        );

        Ok(Self::new(
            collaborators,
            ServiceSettings {
                cache_ttl: Duration::from_secs(config.cache.ttl_secs),
            },
        ))
    }
}
