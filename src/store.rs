//! SQLite-backed [`ContentStore`].
//!
//! Batch reads use a single `IN (...)` query and are re-ordered to match the
//! requested id order; ids with no row are skipped. A repeated id yields its
//! document once, at its first position.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;

use crate::models::{CurriculumDocument, DocumentRow, MinistryStandard};
use crate::traits::ContentStore;

pub struct SqliteContentStore {
    pool: SqlitePool,
}

impl SqliteContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a curriculum document.
    pub async fn upsert_document(&self, doc: &CurriculumDocument) -> Result<()> {
        let objectives = serde_json::to_string(&doc.learning_objectives)?;
        sqlx::query(
            r#"
            INSERT INTO curriculum_content
                (id, title, grade, subject, content_text, learning_objectives,
                 ministry_standard_ref, ministry_approved, keywords, difficulty_level)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                grade = excluded.grade,
                subject = excluded.subject,
                content_text = excluded.content_text,
                learning_objectives = excluded.learning_objectives,
                ministry_standard_ref = excluded.ministry_standard_ref,
                ministry_approved = excluded.ministry_approved,
                keywords = excluded.keywords,
                difficulty_level = excluded.difficulty_level
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(doc.grade)
        .bind(&doc.subject)
        .bind(&doc.content_text)
        .bind(objectives)
        .bind(&doc.ministry_standard_ref)
        .bind(i64::from(doc.ministry_approved))
        .bind(&doc.keywords)
        .bind(&doc.difficulty_level)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_standard(&self, standard: &MinistryStandard) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ministry_standards (oa_code, grade, subject, description, keywords)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(oa_code, grade, subject) DO UPDATE SET
                description = excluded.description,
                keywords = excluded.keywords
            "#,
        )
        .bind(&standard.oa_code)
        .bind(standard.grade)
        .bind(&standard.subject)
        .bind(&standard.description)
        .bind(&standard.keywords)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn fetch_documents_by_ids(&self, ids: &[String]) -> Result<Vec<DocumentRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, title, grade, subject, content_text, learning_objectives, \
             ministry_standard_ref, ministry_approved, keywords, difficulty_level \
             FROM curriculum_content WHERE id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut by_id: HashMap<String, DocumentRow> = rows
            .iter()
            .map(|row| {
                let doc = DocumentRow {
                    id: row.get("id"),
                    title: row.get("title"),
                    grade: row.get("grade"),
                    subject: row.get("subject"),
                    content_text: row.get("content_text"),
                    learning_objectives: row.get("learning_objectives"),
                    ministry_standard_ref: row.get("ministry_standard_ref"),
                    ministry_approved: row.get("ministry_approved"),
                    keywords: row.get("keywords"),
                    difficulty_level: row.get("difficulty_level"),
                };
                (doc.id.clone(), doc)
            })
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn fetch_standards(
        &self,
        oa_codes: &[String],
        grade: u8,
        subject: &str,
    ) -> Result<Vec<MinistryStandard>> {
        if oa_codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT oa_code, grade, subject, description, keywords FROM ministry_standards WHERE grade = ",
        );
        qb.push_bind(i64::from(grade));
        qb.push(" AND subject = ");
        qb.push_bind(subject);
        qb.push(" AND oa_code IN (");
        let mut separated = qb.separated(", ");
        for code in oa_codes {
            separated.push_bind(code);
        }
        separated.push_unseparated(") ORDER BY oa_code ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| MinistryStandard {
                oa_code: row.get("oa_code"),
                description: row.get("description"),
                keywords: row.get("keywords"),
                grade: row.get("grade"),
                subject: row.get("subject"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, migrate};
    use tempfile::TempDir;

    async fn test_store(tmp: &TempDir) -> SqliteContentStore {
        let pool = db::connect_path(&tmp.path().join("store.sqlite"))
            .await
            .unwrap();
        migrate::migrate_pool(&pool).await.unwrap();
        SqliteContentStore::new(pool)
    }

    fn doc(id: &str) -> CurriculumDocument {
        CurriculumDocument {
            id: id.to_string(),
            title: format!("Documento {}", id),
            grade: 5,
            subject: "Matemática".to_string(),
            content_text: "Las fracciones representan partes de un entero.".to_string(),
            learning_objectives: vec!["OA-MAT-5-03".to_string()],
            ministry_standard_ref: None,
            ministry_approved: true,
            keywords: Some("fracciones".to_string()),
            difficulty_level: "medium".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_preserves_requested_order() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        for id in ["a", "b", "c"] {
            store.upsert_document(&doc(id)).await.unwrap();
        }

        let ids: Vec<String> = ["c", "missing", "a", "b", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = store.fetch_documents_by_ids(&ids).await.unwrap();
        let got: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(got, vec!["c", "a", "b"]);
        assert_eq!(rows[0].ministry_approved, 1);
        assert_eq!(rows[0].learning_objectives.as_deref(), Some("[\"OA-MAT-5-03\"]"));
    }

    #[tokio::test]
    async fn test_fetch_standards_scoped() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        for (code, grade) in [("OA-MAT-5-03", 5), ("OA-MAT-5-04", 5), ("OA-MAT-5-03", 6)] {
            store
                .upsert_standard(&MinistryStandard {
                    oa_code: code.to_string(),
                    description: "Demostrar comprensión de las fracciones".to_string(),
                    keywords: None,
                    grade,
                    subject: "Matemática".to_string(),
                })
                .await
                .unwrap();
        }

        let codes = vec!["OA-MAT-5-03".to_string(), "OA-XX-1-01".to_string()];
        let found = store.fetch_standards(&codes, 5, "Matemática").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].grade, 5);

        let none = store.fetch_standards(&codes, 5, "Historia").await.unwrap();
        assert!(none.is_empty());
        assert!(store.fetch_standards(&[], 5, "Matemática").await.unwrap().is_empty());
    }
}
