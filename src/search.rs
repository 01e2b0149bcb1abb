//! Search stage: cache lookup → embedding → vector query → cache write.
//!
//! # Flow
//!
//! 1. Validate `query` (≥ 3 chars), `grade` (1–12), `subject` (non-empty).
//! 2. Clamp `limit` into `1..=50` (default 10) and derive the cache key.
//! 3. On a cache hit with a decodable payload, return it with `cached = true`.
//!    No model or index call is made.
//! 4. Otherwise embed the raw query text, query the index with an exact
//!    grade/subject filter, and keep the index's order (score-descending).
//! 5. Write the fresh result to the cache with the configured TTL, then return it.
//!
//! Concurrent identical misses are not coalesced; each one calls the
//! embedding model and the index.

use sha2::{Digest, Sha256};
use std::time::Instant;

use crate::error::{upstream, ServiceError};
use crate::input;
use crate::models::{
    elapsed_ms, Grade, MatchMetadata, SearchQuery, SearchResult, DEFAULT_SEARCH_LIMIT,
    MAX_SEARCH_LIMIT,
};
use crate::service::CurriculumService;
use crate::traits::{VectorFilter, VectorQueryOptions, VectorQueryResponse};

/// Requested limit clamped into `1..=MAX_SEARCH_LIMIT`.
pub fn effective_limit(limit: Option<i64>) -> u32 {
    match limit {
        None => DEFAULT_SEARCH_LIMIT,
        Some(l) => l.clamp(1, i64::from(MAX_SEARCH_LIMIT)) as u32,
    }
}

/// Deterministic cache key for a validated search.
///
/// The query text is hashed so keys stay short regardless of query length.
pub fn cache_key(query: &str, grade: Grade, subject: &str, limit: u32) -> String {
    let digest = Sha256::digest(query.as_bytes());
    format!(
        "search:v1:{}:{}:{}:{}",
        hex::encode(digest),
        grade,
        subject,
        limit
    )
}

impl CurriculumService {
    pub async fn search(&self, req: &SearchQuery) -> Result<SearchResult, ServiceError> {
        let start = Instant::now();

        input::min_chars(&req.query, 3, "query", ServiceError::InvalidQuery)?;
        let grade = input::grade(req.grade)?;
        input::subject(&req.subject)?;

        let limit = effective_limit(req.limit);
        let key = cache_key(&req.query, grade, &req.subject, limit);

        if let Some(mut hit) = self.cached_result(&key).await {
            hit.cached = true;
            hit.search_time_ms = elapsed_ms(start);
            tracing::debug!(%key, total_found = hit.total_found, "search cache hit");
            return Ok(hit);
        }
        tracing::debug!(%key, "search cache miss");

        if !self.index.is_available() {
            return Err(ServiceError::SearchUnavailable(format!(
                "Vector index '{}' is not available",
                self.index.name()
            )));
        }

        let vector = self
            .embedder
            .embed(&req.query)
            .await
            .map_err(|e| ServiceError::EmbeddingFailed(upstream("Failed to embed query", e)))?;
        if vector.is_empty() {
            return Err(ServiceError::EmbeddingFailed(
                "Embedding model returned an empty vector".to_string(),
            ));
        }

        let options = VectorQueryOptions {
            top_k: limit,
            filter: VectorFilter {
                grade: grade.value(),
                subject: req.subject.clone(),
            },
            return_metadata: true,
        };
        let response = self
            .index
            .query(&vector, &options)
            .await
            .map_err(|e| ServiceError::SearchFailed(upstream("Vector query failed", e)))?;

        let mut result = build_result(req, grade, response);
        result.search_time_ms = elapsed_ms(start);

        match serde_json::to_string(&result) {
            Ok(payload) => {
                if let Err(e) = self.cache.put(&key, payload, self.settings.cache_ttl).await {
                    tracing::warn!(%key, error = %e, "failed to write search result to cache");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode search result for cache"),
        }

        tracing::info!(
            grade = grade.value(),
            subject = %req.subject,
            total_found = result.total_found,
            search_time_ms = result.search_time_ms,
            "search completed"
        );
        Ok(result)
    }

    /// A decodable, internally consistent cached result, or `None`.
    async fn cached_result(&self, key: &str) -> Option<SearchResult> {
        let payload = match self.cache.get(key).await {
            Ok(Some(p)) => p,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<SearchResult>(&payload) {
            Ok(r) if r.content_ids.len() == r.metadata.len() => Some(r),
            Ok(_) => {
                tracing::warn!(%key, "cached search result is inconsistent; treating as miss");
                None
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "cached search result is undecodable; treating as miss");
                None
            }
        }
    }
}

fn build_result(req: &SearchQuery, grade: Grade, response: VectorQueryResponse) -> SearchResult {
    let metadata: Vec<MatchMetadata> = response
        .matches
        .into_iter()
        .map(|m| {
            let meta = m.metadata.unwrap_or_default();
            MatchMetadata {
                id: m.id,
                score: m.score,
                title: meta.title.unwrap_or_default(),
                oa: meta.oa.unwrap_or_default(),
            }
        })
        .collect();

    SearchResult {
        query: req.query.clone(),
        grade,
        subject: req.subject.clone(),
        total_found: metadata.len(),
        content_ids: metadata.iter().map(|m| m.id.clone()).collect(),
        metadata,
        cached: false,
        search_time_ms: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(None), 10);
        assert_eq!(effective_limit(Some(25)), 25);
        assert_eq!(effective_limit(Some(500)), 50);
        assert_eq!(effective_limit(Some(0)), 1);
        assert_eq!(effective_limit(Some(-4)), 1);
    }

    #[test]
    fn test_cache_key_is_deterministic_and_discriminating() {
        let g5 = Grade::new(5).unwrap();
        let a = cache_key("¿Qué son las fracciones?", g5, "Matemática", 10);
        assert_eq!(a, cache_key("¿Qué son las fracciones?", g5, "Matemática", 10));
        assert!(a.starts_with("search:v1:"));
        assert!(a.ends_with(":5:Matemática:10"));
        assert_ne!(a, cache_key("¿Qué son las fracciones?", g5, "Matemática", 11));
        assert_ne!(
            a,
            cache_key("¿Qué son las fracciones?", Grade::new(6).unwrap(), "Matemática", 10)
        );
        assert_ne!(a, cache_key("¿Qué es un decimal?", g5, "Matemática", 10));
    }
}
