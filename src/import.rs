//! Curriculum corpus import.
//!
//! Loads a JSON file of documents and ministry standards into SQLite:
//!
//! ```json
//! {
//!   "documents": [{ "id": "mat-5-fracciones", "title": "...", "grade": 5,
//!                   "subject": "Matemática", "content_text": "...",
//!                   "learning_objectives": ["OA-MAT-5-03"] }],
//!   "standards": [{ "oa_code": "OA-MAT-5-03", "grade": 5,
//!                   "subject": "Matemática", "description": "..." }]
//! }
//! ```
//!
//! When embeddings are enabled and the vector provider is `sqlite`, each
//! document is embedded inline and its vector stored in `content_vectors`.
//! Embedding is non-fatal: a failed document is counted and skipped.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::models::{CurriculumDocument, MinistryStandard};
use crate::store::SqliteContentStore;
use crate::traits::VectorMetadata;
use crate::vector::SqliteVectorIndex;

#[derive(Debug, Deserialize)]
pub struct ImportFile {
    #[serde(default)]
    pub documents: Vec<ImportDocument>,
    #[serde(default)]
    pub standards: Vec<MinistryStandard>,
}

#[derive(Debug, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub grade: i64,
    pub subject: String,
    pub content_text: String,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub ministry_standard_ref: Option<String>,
    #[serde(default)]
    pub ministry_approved: bool,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
}

impl ImportDocument {
    fn into_document(self) -> CurriculumDocument {
        CurriculumDocument {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            title: self.title,
            grade: self.grade,
            subject: self.subject,
            content_text: self.content_text,
            learning_objectives: self.learning_objectives,
            ministry_standard_ref: self.ministry_standard_ref,
            ministry_approved: self.ministry_approved,
            keywords: self.keywords,
            difficulty_level: self.difficulty_level.unwrap_or_else(|| "medium".to_string()),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub documents: usize,
    pub standards: usize,
    pub vectors: usize,
    pub embed_failures: usize,
}

pub async fn run_import(config: &Config, path: &Path) -> Result<ImportStats> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let file: ImportFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse import file: {}", path.display()))?;

    let pool = db::connect(config).await?;
    let store = SqliteContentStore::new(pool.clone());
    let index = SqliteVectorIndex::new(pool.clone());

    let embed_inline = config.embedding.is_enabled() && config.vector.provider == "sqlite";
    if !embed_inline {
        tracing::warn!(
            embedding = %config.embedding.provider,
            vector = %config.vector.provider,
            "skipping vectors: requires an enabled embedding provider and the sqlite vector index"
        );
    }
    let embedder = create_embedder(&config.embedding)?;

    let mut stats = ImportStats::default();

    for standard in &file.standards {
        store.upsert_standard(standard).await?;
        stats.standards += 1;
    }

    for item in file.documents {
        let doc = item.into_document();
        store.upsert_document(&doc).await?;
        stats.documents += 1;

        if !embed_inline {
            continue;
        }

        let text = format!("{}\n\n{}", doc.title, doc.content_text);
        match embedder.embed(&text).await {
            Ok(vector) if !vector.is_empty() => {
                let metadata = VectorMetadata {
                    title: Some(doc.title.clone()),
                    oa: doc.learning_objectives.first().cloned(),
                };
                index
                    .upsert_vector(
                        &doc.id,
                        doc.grade,
                        &doc.subject,
                        &metadata,
                        embedder.model_name(),
                        &vector,
                    )
                    .await?;
                stats.vectors += 1;
            }
            Ok(_) => {
                tracing::warn!(id = %doc.id, "embedding model returned an empty vector");
                stats.embed_failures += 1;
            }
            Err(e) => {
                tracing::warn!(id = %doc.id, error = %e, "failed to embed document");
                stats.embed_failures += 1;
            }
        }
    }

    pool.close().await;

    tracing::info!(
        documents = stats.documents,
        standards = stats.standards,
        vectors = stats.vectors,
        "import completed"
    );
    Ok(stats)
}
