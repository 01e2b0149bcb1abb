//! Error taxonomy shared by the four operations.
//!
//! Three classes of failure exist:
//!
//! | Class | HTTP | Raised |
//! |-------|------|--------|
//! | Input validation | 400 | before any collaborator is called |
//! | Upstream failure | 500 | a collaborator errored or returned an invalid shape |
//! | Unavailable | 503 | the vector index is not provisioned |
//!
//! Every variant carries a human-readable message; upstream variants embed
//! the underlying error text for diagnostics.

use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidQuery(String),
    #[error("{0}")]
    InvalidGrade(String),
    #[error("{0}")]
    InvalidSubject(String),
    #[error("{0}")]
    InvalidContext(String),
    #[error("{0}")]
    InvalidContent(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    EmbeddingFailed(String),
    #[error("{0}")]
    SearchFailed(String),
    #[error("{0}")]
    SearchUnavailable(String),
    #[error("{0}")]
    DbQueryFailed(String),
    #[error("{0}")]
    FetchFailed(String),
    #[error("{0}")]
    GenerationFailed(String),
    #[error("{0}")]
    ValidationFailed(String),
}

impl ServiceError {
    /// Machine-readable wire code, e.g. `"INVALID_GRADE"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::InvalidGrade(_) => "INVALID_GRADE",
            Self::InvalidSubject(_) => "INVALID_SUBJECT",
            Self::InvalidContext(_) => "INVALID_CONTEXT",
            Self::InvalidContent(_) => "INVALID_CONTENT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::EmbeddingFailed(_) => "EMBEDDING_FAILED",
            Self::SearchFailed(_) => "SEARCH_FAILED",
            Self::SearchUnavailable(_) => "SEARCH_UNAVAILABLE",
            Self::DbQueryFailed(_) => "DB_QUERY_FAILED",
            Self::FetchFailed(_) => "FETCH_FAILED",
            Self::GenerationFailed(_) => "GENERATION_FAILED",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidQuery(_)
            | Self::InvalidGrade(_)
            | Self::InvalidSubject(_)
            | Self::InvalidContext(_)
            | Self::InvalidContent(_)
            | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::SearchUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::EmbeddingFailed(_)
            | Self::SearchFailed(_)
            | Self::DbQueryFailed(_)
            | Self::FetchFailed(_)
            | Self::GenerationFailed(_)
            | Self::ValidationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for errors detected before any collaborator call.
    pub fn is_validation(&self) -> bool {
        self.status() == StatusCode::BAD_REQUEST
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: "Error",
            code: self.code(),
            message: self.to_string(),
            details: None,
        }
    }
}

/// Wraps an upstream error with context, keeping the source message.
pub(crate) fn upstream(context: &str, err: anyhow::Error) -> String {
    format!("{}: {:#}", context, err)
}

/// JSON error body: `{"error":"Error","code":...,"message":...,"details"?:...}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: &'static str,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(
            ServiceError::InvalidGrade("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::SearchUnavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::DbQueryFailed("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(ServiceError::InvalidRequest("x".into()).is_validation());
        assert!(!ServiceError::FetchFailed("x".into()).is_validation());
    }

    #[test]
    fn test_envelope_shape() {
        let json =
            serde_json::to_value(ServiceError::InvalidQuery("too short".into()).envelope())
                .unwrap();
        assert_eq!(json["error"], "Error");
        assert_eq!(json["code"], "INVALID_QUERY");
        assert_eq!(json["message"], "too short");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_upstream_keeps_source_message() {
        let msg = upstream("Embedding failed", anyhow::anyhow!("connection refused"));
        assert_eq!(msg, "Embedding failed: connection refused");
    }
}
