//! Core data models for the four operations.
//!
//! Request types are deliberately lenient (every field defaults) so that a
//! missing or out-of-range field surfaces as the operation's own validation
//! error code instead of a generic deserialization failure. Result types are
//! strict, one per operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of results a search may request.
pub const MAX_SEARCH_LIMIT: u32 = 50;
/// Limit applied when a search request omits one.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
/// Maximum number of ids honoured by a single fetch.
pub const MAX_FETCH_IDS: usize = 50;

/// A school grade in `1..=12`.
///
/// Grades 1–8 are *Educación Básica*, 9–12 are *Educación Media*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(u8);

impl Grade {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 12;

    /// Returns `None` when `value` is outside `1..=12`.
    pub fn new(value: i64) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Localized grade label, e.g. `"5° Básico"` or `"2° Medio"`.
    pub fn localized(self) -> String {
        if self.0 <= 8 {
            format!("{}° Básico", self.0)
        } else {
            format!("{}° Medio", self.0 - 8)
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============ Search ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub query: String,
    pub grade: Option<i64>,
    pub subject: String,
    pub limit: Option<i64>,
}

/// Per-match metadata, parallel to [`SearchResult::content_ids`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub id: String,
    pub score: f32,
    pub title: String,
    pub oa: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub grade: Grade,
    pub subject: String,
    pub total_found: usize,
    pub content_ids: Vec<String>,
    pub metadata: Vec<MatchMetadata>,
    pub cached: bool,
    pub search_time_ms: u64,
}

// ============ Fetch ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchRequest {
    pub content_ids: Vec<String>,
}

/// A row of `curriculum_content` exactly as the content store returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub title: String,
    pub grade: i64,
    pub subject: String,
    pub content_text: String,
    /// JSON array of OA codes, stored as text.
    pub learning_objectives: Option<String>,
    pub ministry_standard_ref: Option<String>,
    /// `0`/`1` flag.
    pub ministry_approved: i64,
    pub keywords: Option<String>,
    pub difficulty_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumDocument {
    pub id: String,
    pub title: String,
    pub grade: i64,
    pub subject: String,
    pub content_text: String,
    pub learning_objectives: Vec<String>,
    pub ministry_standard_ref: Option<String>,
    pub ministry_approved: bool,
    pub keywords: Option<String>,
    pub difficulty_level: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub contents: Vec<CurriculumDocument>,
    pub fetch_time_ms: u64,
}

// ============ Generate ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub context: String,
    pub query: String,
    pub grade: Option<i64>,
    pub subject: String,
    pub oa_codes: Vec<String>,
    /// `explanation` (default), `summary`, or `example`.
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub generated_text: String,
    pub oa_codes: Vec<String>,
    pub model_used: String,
    pub generation_time_ms: u64,
}

// ============ Validate ============

/// An official learning objective scoped to a grade and subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryStandard {
    pub oa_code: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Option<String>,
    pub grade: i64,
    pub subject: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationRequest {
    pub content: String,
    pub grade: Option<i64>,
    pub subject: String,
    pub expected_oa: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationDetails {
    pub oa_alignment: u8,
    pub grade_appropriate: u8,
    pub chilean_terminology: u8,
    pub learning_coverage: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub score: u8,
    pub validation_details: ValidationDetails,
    pub validation_time_ms: u64,
}

/// Milliseconds elapsed since `start`, saturating.
pub(crate) fn elapsed_ms(start: std::time::Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
