//! Fetch stage: ordered batch retrieval of curriculum documents.
//!
//! Ids are truncated to the first 50, read in one batch, and returned in the
//! requested order. Unknown ids are skipped silently.

use std::collections::HashMap;
use std::time::Instant;

use crate::error::{upstream, ServiceError};
use crate::models::{
    elapsed_ms, CurriculumDocument, DocumentRow, FetchRequest, FetchResult, MAX_FETCH_IDS,
};
use crate::service::CurriculumService;

const DEFAULT_DIFFICULTY: &str = "medium";

impl CurriculumService {
    pub async fn fetch(&self, req: &FetchRequest) -> Result<FetchResult, ServiceError> {
        let start = Instant::now();

        if req.content_ids.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "content_ids must be a non-empty array".to_string(),
            ));
        }

        let ids = &req.content_ids[..req.content_ids.len().min(MAX_FETCH_IDS)];
        if ids.len() < req.content_ids.len() {
            tracing::debug!(
                requested = req.content_ids.len(),
                kept = ids.len(),
                "truncating fetch ids"
            );
        }

        let rows = self
            .store
            .fetch_documents_by_ids(ids)
            .await
            .map_err(|e| ServiceError::DbQueryFailed(upstream("Content store query failed", e)))?;

        let mut by_id: HashMap<String, DocumentRow> = HashMap::with_capacity(rows.len());
        for row in rows {
            if !ids.contains(&row.id) {
                return Err(ServiceError::FetchFailed(format!(
                    "Content store returned unrequested document '{}'",
                    row.id
                )));
            }
            by_id.insert(row.id.clone(), row);
        }

        // Requested order, each document at most once.
        let contents: Vec<CurriculumDocument> = ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(into_document)
            .collect();
        let result = FetchResult {
            contents,
            fetch_time_ms: elapsed_ms(start),
        };

        tracing::info!(
            requested = ids.len(),
            found = result.contents.len(),
            fetch_time_ms = result.fetch_time_ms,
            "fetch completed"
        );
        Ok(result)
    }
}

/// Converts a stored row, tolerating malformed learning-objective JSON.
fn into_document(row: DocumentRow) -> CurriculumDocument {
    let learning_objectives = parse_objectives(&row.id, row.learning_objectives.as_deref());

    CurriculumDocument {
        id: row.id,
        title: row.title,
        grade: row.grade,
        subject: row.subject,
        content_text: row.content_text,
        learning_objectives,
        ministry_standard_ref: row.ministry_standard_ref,
        ministry_approved: row.ministry_approved != 0,
        keywords: row.keywords,
        difficulty_level: row
            .difficulty_level
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
    }
}

fn parse_objectives(id: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(codes) => codes,
        Err(e) => {
            tracing::warn!(id, error = %e, "unparseable learning_objectives; using empty list");
            Vec::new()
        }
    }
}
