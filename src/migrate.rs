//! Idempotent schema migrations.
//!
//! | Table | Holds |
//! |-------|-------|
//! | `curriculum_content` | curriculum documents served by fetch |
//! | `ministry_standards` | OA descriptions used by validation |
//! | `content_vectors` | document vectors for the `sqlite` vector index |
//! | `cache_entries` | search results for the `sqlite` cache backend |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS curriculum_content (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            grade INTEGER NOT NULL,
            subject TEXT NOT NULL,
            content_text TEXT NOT NULL,
            learning_objectives TEXT NOT NULL DEFAULT '[]',
            ministry_standard_ref TEXT,
            ministry_approved INTEGER NOT NULL DEFAULT 0,
            keywords TEXT,
            difficulty_level TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ministry_standards (
            oa_code TEXT NOT NULL,
            grade INTEGER NOT NULL,
            subject TEXT NOT NULL,
            description TEXT NOT NULL,
            keywords TEXT,
            PRIMARY KEY (oa_code, grade, subject)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_vectors (
            id TEXT PRIMARY KEY,
            grade INTEGER NOT NULL,
            subject TEXT NOT NULL,
            title TEXT,
            oa TEXT,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cache_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_content_grade_subject ON curriculum_content(grade, subject)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vectors_grade_subject ON content_vectors(grade, subject)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cache_expires_at ON cache_entries(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}
