//! [`VectorIndex`] implementations.
//!
//! | Config Value | Index |
//! |-------------|-------|
//! | `"sqlite"` | [`SqliteVectorIndex`]: brute-force cosine over `content_vectors` |
//! | `"synthetic"` | [`SyntheticVectorIndex`]: fixed matches, development only |
//! | `"disabled"` | [`DisabledVectorIndex`]: reports itself unavailable |

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::traits::{VectorIndex, VectorMatch, VectorMetadata, VectorQueryOptions, VectorQueryResponse};

// ============ SQLite ============

/// Vectors stored as little-endian f32 BLOBs next to their grade/subject.
///
/// The grade/subject filter runs in SQL; similarity ranking runs in Rust.
pub struct SqliteVectorIndex {
    pool: SqlitePool,
}

impl SqliteVectorIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert_vector(
        &self,
        id: &str,
        grade: i64,
        subject: &str,
        metadata: &VectorMetadata,
        model: &str,
        vector: &[f32],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_vectors (id, grade, subject, title, oa, model, dims, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                grade = excluded.grade,
                subject = excluded.subject,
                title = excluded.title,
                oa = excluded.oa,
                model = excluded.model,
                dims = excluded.dims,
                embedding = excluded.embedding
            "#,
        )
        .bind(id)
        .bind(grade)
        .bind(subject)
        .bind(&metadata.title)
        .bind(&metadata.oa)
        .bind(model)
        .bind(vector.len() as i64)
        .bind(vec_to_blob(vector))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn query(
        &self,
        vector: &[f32],
        options: &VectorQueryOptions,
    ) -> Result<VectorQueryResponse> {
        let rows = sqlx::query(
            "SELECT id, title, oa, embedding FROM content_vectors WHERE grade = ? AND subject = ?",
        )
        .bind(i64::from(options.filter.grade))
        .bind(&options.filter.subject)
        .fetch_all(&self.pool)
        .await?;

        let mut matches: Vec<VectorMatch> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let score = cosine_similarity(vector, &blob_to_vec(&blob));
                let metadata = options.return_metadata.then(|| VectorMetadata {
                    title: row.get("title"),
                    oa: row.get("oa"),
                });
                VectorMatch {
                    id: row.get("id"),
                    score,
                    metadata,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(options.top_k as usize);

        Ok(VectorQueryResponse {
            count: matches.len(),
            matches,
        })
    }
}

// ============ Synthetic ============

const SYNTHETIC_SCORES: [f32; 3] = [0.92, 0.87, 0.82];

/// Development stand-in for a real index: returns up to three fixed matches
/// derived from the filter, ignoring the query vector.
pub struct SyntheticVectorIndex;

#[async_trait]
impl VectorIndex for SyntheticVectorIndex {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn query(
        &self,
        _vector: &[f32],
        options: &VectorQueryOptions,
    ) -> Result<VectorQueryResponse> {
        let grade = options.filter.grade;
        let subject = &options.filter.subject;
        let prefix: String = subject
            .chars()
            .filter(|c| c.is_alphabetic())
            .take(3)
            .collect::<String>()
            .to_uppercase();

        let matches: Vec<VectorMatch> = SYNTHETIC_SCORES
            .iter()
            .take(options.top_k as usize)
            .enumerate()
            .map(|(i, &score)| VectorMatch {
                id: format!("synthetic-{}-{}", grade, i + 1),
                score,
                metadata: options.return_metadata.then(|| VectorMetadata {
                    title: Some(format!("{} {}° - contenido de ejemplo {}", subject, grade, i + 1)),
                    oa: Some(format!("OA-{}-{}-{:02}", prefix, grade, i + 1)),
                }),
            })
            .collect();

        Ok(VectorQueryResponse {
            count: matches.len(),
            matches,
        })
    }
}

// ============ Disabled ============

pub struct DisabledVectorIndex;

#[async_trait]
impl VectorIndex for DisabledVectorIndex {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn query(
        &self,
        _vector: &[f32],
        _options: &VectorQueryOptions,
    ) -> Result<VectorQueryResponse> {
        bail!("Vector index is not provisioned")
    }
}

/// Create the configured [`VectorIndex`]. `pool` backs the `sqlite` variant.
pub fn create_vector_index(config: &Config, pool: SqlitePool) -> Result<Arc<dyn VectorIndex>> {
    match config.vector.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorIndex::new(pool))),
        "synthetic" if config.is_development() => Ok(Arc::new(SyntheticVectorIndex)),
        "synthetic" => bail!("Synthetic vector index is only available in development"),
        "disabled" => Ok(Arc::new(DisabledVectorIndex)),
        other => bail!("Unknown vector provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::VectorFilter;
    use crate::{db, migrate};
    use tempfile::TempDir;

    fn options(top_k: u32, grade: u8, subject: &str) -> VectorQueryOptions {
        VectorQueryOptions {
            top_k,
            filter: VectorFilter {
                grade,
                subject: subject.to_string(),
            },
            return_metadata: true,
        }
    }

    #[tokio::test]
    async fn test_sqlite_index_filters_and_ranks() {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("vec.sqlite")).await.unwrap();
        migrate::migrate_pool(&pool).await.unwrap();
        let index = SqliteVectorIndex::new(pool);

        let meta = |t: &str| VectorMetadata {
            title: Some(t.to_string()),
            oa: Some("OA-MAT-5-03".to_string()),
        };
        index
            .upsert_vector("far", 5, "Matemática", &meta("Lejos"), "m", &[0.0, 1.0])
            .await
            .unwrap();
        index
            .upsert_vector("near", 5, "Matemática", &meta("Cerca"), "m", &[1.0, 0.1])
            .await
            .unwrap();
        index
            .upsert_vector("other-grade", 6, "Matemática", &meta("Otro"), "m", &[1.0, 0.0])
            .await
            .unwrap();
        index
            .upsert_vector("other-subject", 5, "Matemáticas", &meta("Otro"), "m", &[1.0, 0.0])
            .await
            .unwrap();

        let resp = index
            .query(&[1.0, 0.0], &options(10, 5, "Matemática"))
            .await
            .unwrap();
        let ids: Vec<&str> = resp.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert_eq!(resp.count, 2);
        assert_eq!(
            resp.matches[0].metadata.as_ref().and_then(|m| m.title.as_deref()),
            Some("Cerca")
        );

        let top1 = index
            .query(&[1.0, 0.0], &options(1, 5, "Matemática"))
            .await
            .unwrap();
        assert_eq!(top1.count, 1);
    }

    #[tokio::test]
    async fn test_synthetic_index_respects_top_k() {
        let resp = SyntheticVectorIndex
            .query(&[], &options(2, 5, "Matemática"))
            .await
            .unwrap();
        assert_eq!(resp.count, 2);
        assert_eq!(resp.matches[0].score, 0.92);
        assert_eq!(
            resp.matches[1].metadata.as_ref().and_then(|m| m.oa.as_deref()),
            Some("OA-MAT-5-02")
        );
    }

    #[test]
    fn test_disabled_index_unavailable() {
        assert!(!DisabledVectorIndex.is_available());
        assert!(SyntheticVectorIndex.is_available());
    }
}
