//! Collaborator interfaces consumed by the service.
//!
//! Every external system the four operations touch is reached through one
//! of these traits. Concrete implementations are chosen from configuration
//! at startup ([`CurriculumService::from_config`](crate::service::CurriculumService::from_config));
//! tests substitute in-process doubles.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                  CurriculumService                    │
//! │  ┌───────────┐ ┌────────────┐ ┌────────┐ ┌─────────┐  │
//! │  │ Embedding │ │ Generation │ │ Vector │ │ Content │  │
//! │  │  Client   │ │   Client   │ │ Index  │ │  Store  │  │
//! │  └───────────┘ └────────────┘ └────────┘ └─────────┘  │
//! │                  ┌─────────────┐                      │
//! │                  │ ResultCache │                      │
//! │                  └─────────────┘                      │
//! └───────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{DocumentRow, MinistryStandard};

// ═══════════════════════════════════════════════════════════════════════
// Model clients
// ═══════════════════════════════════════════════════════════════════════

/// Turns query text into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed a single text. An empty vector is a valid (if useless) reply;
    /// callers decide whether to treat it as a failure.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Turns a prompt into generated text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Returns the model identifier reported as `model_used`.
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String>;
}

// ═══════════════════════════════════════════════════════════════════════
// Vector index
// ═══════════════════════════════════════════════════════════════════════

/// Exact-match metadata filter applied by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorFilter {
    pub grade: u8,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorQueryOptions {
    pub top_k: u32,
    pub filter: VectorFilter,
    pub return_metadata: bool,
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub oa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<VectorMetadata>,
}

/// Matches in descending score order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorQueryResponse {
    pub count: usize,
    pub matches: Vec<VectorMatch>,
}

/// Nearest-neighbour search over curriculum document vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short identifier used in logs (`"sqlite"`, `"synthetic"`, ...).
    fn name(&self) -> &str;

    /// Whether the index is provisioned at all. Searches against an
    /// unavailable index fail before the embedding model is called.
    fn is_available(&self) -> bool {
        true
    }

    async fn query(
        &self,
        vector: &[f32],
        options: &VectorQueryOptions,
    ) -> Result<VectorQueryResponse>;
}

// ═══════════════════════════════════════════════════════════════════════
// Content store
// ═══════════════════════════════════════════════════════════════════════

/// Batch lookup of curriculum documents and ministry standards.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Returns the rows for `ids`, ordered to match `ids`. Unknown ids are
    /// absent from the result.
    async fn fetch_documents_by_ids(&self, ids: &[String]) -> Result<Vec<DocumentRow>>;

    /// Returns the standards among `oa_codes` scoped to `(grade, subject)`.
    async fn fetch_standards(
        &self,
        oa_codes: &[String],
        grade: u8,
        subject: &str,
    ) -> Result<Vec<MinistryStandard>>;
}

// ═══════════════════════════════════════════════════════════════════════
// Result cache
// ═══════════════════════════════════════════════════════════════════════

/// Key/value store with per-entry TTL.
///
/// Entries are never invalidated explicitly; they expire by TTL only.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}
