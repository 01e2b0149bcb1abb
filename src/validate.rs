//! Validation engine: rubric scoring of arbitrary content.
//!
//! The generation model is asked to answer in a fixed labeled format:
//!
//! ```text
//! OA_SCORE: 85
//! GRADE_SCORE: 90
//! CHILEAN_SCORE: 88
//! COVERAGE_SCORE: 80
//! ISSUES: falta un ejemplo concreto, vocabulario avanzado
//! RECOMMENDATIONS: ninguno
//! ```
//!
//! Parsing never fails. A missing or unreadable score defaults to a neutral
//! 50, every score is clamped into `0..=100`, and empty issue/recommendation
//! lists are replaced by a fixed placeholder. Defaulted labels are logged and
//! reported in [`RubricScores::missing`]; they never change the outcome.
//!
//! ```text
//! score    = round(0.4·oa + 0.3·grade + 0.2·chilean + 0.1·coverage)
//! is_valid = score ≥ 70
//! ```

use regex::Regex;
use std::sync::LazyLock;
use std::time::Instant;

use crate::error::{upstream, ServiceError};
use crate::input;
use crate::models::{elapsed_ms, MinistryStandard, ValidationDetails, ValidationRequest, ValidationResult};
use crate::prompt::build_rubric_prompt;
use crate::service::CurriculumService;
use crate::traits::GenerationParams;

/// Structured output needs less room and less creativity than tutoring.
pub const VALIDATION_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 300,
    temperature: 0.3,
};

/// Minimum overall score for `is_valid`.
pub const PASS_THRESHOLD: u8 = 70;

const NEUTRAL_SCORE: i64 = 50;

pub const NO_ISSUES_PLACEHOLDER: &str = "No se detectaron problemas";
pub const NO_RECOMMENDATIONS_PLACEHOLDER: &str = "El contenido cumple con los estándares curriculares";

static OA_SCORE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| score_regex("OA_SCORE"));
static GRADE_SCORE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| score_regex("GRADE_SCORE"));
static CHILEAN_SCORE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| score_regex("CHILEAN_SCORE"));
static COVERAGE_SCORE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| score_regex("COVERAGE_SCORE"));
/// Any all-caps `LABEL:` token, known or not.
static LABEL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b[A-Z][A-Z_]*:").ok());

fn compiled(cell: &'static LazyLock<Option<Regex>>) -> Option<&'static Regex> {
    (**cell).as_ref()
}

fn score_regex(label: &str) -> Option<Regex> {
    // Tolerates markdown emphasis between the label and the number.
    Regex::new(&format!(r"{}:[\s*]*(-?\d+)", label)).ok()
}

/// Scores and lists read from a rubric response.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricScores {
    pub oa_alignment: u8,
    pub grade_appropriate: u8,
    pub chilean_terminology: u8,
    pub learning_coverage: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    /// Labels that were absent or unreadable and fell back to a default.
    pub missing: Vec<&'static str>,
}

impl RubricScores {
    pub fn score(&self) -> u8 {
        weighted_score(
            self.oa_alignment,
            self.grade_appropriate,
            self.chilean_terminology,
            self.learning_coverage,
        )
    }

    pub fn into_details(self) -> ValidationDetails {
        ValidationDetails {
            oa_alignment: self.oa_alignment,
            grade_appropriate: self.grade_appropriate,
            chilean_terminology: self.chilean_terminology,
            learning_coverage: self.learning_coverage,
            issues: self.issues,
            recommendations: self.recommendations,
        }
    }
}

/// `round(0.4·oa + 0.3·grade + 0.2·chilean + 0.1·coverage)`, computed in
/// tenths so that halves round up exactly.
pub fn weighted_score(oa: u8, grade: u8, chilean: u8, coverage: u8) -> u8 {
    let tenths = 4 * u32::from(oa) + 3 * u32::from(grade) + 2 * u32::from(chilean) + u32::from(coverage);
    ((tenths + 5) / 10).min(100) as u8
}

pub fn parse_rubric(text: &str) -> RubricScores {
    let mut missing = Vec::new();

    let mut score = |cell: &'static LazyLock<Option<Regex>>, label: &'static str| -> u8 {
        let parsed = compiled(cell)
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| saturating_parse(m.as_str()));
        let value = parsed.unwrap_or_else(|| {
            missing.push(label);
            NEUTRAL_SCORE
        });
        value.clamp(0, 100) as u8
    };

    let oa_alignment = score(&OA_SCORE_RE, "OA_SCORE");
    let grade_appropriate = score(&GRADE_SCORE_RE, "GRADE_SCORE");
    let chilean_terminology = score(&CHILEAN_SCORE_RE, "CHILEAN_SCORE");
    let learning_coverage = score(&COVERAGE_SCORE_RE, "COVERAGE_SCORE");

    let issues = match section(text, "ISSUES:") {
        Some(raw) => split_list(raw),
        None => {
            missing.push("ISSUES");
            Vec::new()
        }
    };
    let recommendations = match section(text, "RECOMMENDATIONS:") {
        Some(raw) => split_list(raw),
        None => {
            missing.push("RECOMMENDATIONS");
            Vec::new()
        }
    };

    RubricScores {
        oa_alignment,
        grade_appropriate,
        chilean_terminology,
        learning_coverage,
        issues: or_placeholder(issues, NO_ISSUES_PLACEHOLDER),
        recommendations: or_placeholder(recommendations, NO_RECOMMENDATIONS_PLACEHOLDER),
        missing,
    }
}

/// Digits too long for `i64` saturate toward their sign.
fn saturating_parse(digits: &str) -> i64 {
    digits.parse().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Text after `label` up to the next all-caps label or the end of `text`.
fn section<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let start = text.find(label)? + label.len();
    let rest = &text[start..];
    let end = compiled(&LABEL_RE)
        .and_then(|re| re.find(rest))
        .map(|m| m.start())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Comma/line separated items; bullets and emphasis stripped, `ninguno` dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(|item| {
            item.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_end_matches(['*', '.'])
                .trim()
        })
        .filter(|item| !item.is_empty() && !item.eq_ignore_ascii_case("ninguno"))
        .map(str::to_string)
        .collect()
}

fn or_placeholder(items: Vec<String>, placeholder: &str) -> Vec<String> {
    if items.is_empty() {
        vec![placeholder.to_string()]
    } else {
        items
    }
}

impl CurriculumService {
    pub async fn validate(
        &self,
        req: &ValidationRequest,
    ) -> Result<ValidationResult, ServiceError> {
        let start = Instant::now();

        input::min_chars(&req.content, 10, "content", ServiceError::InvalidContent)?;
        let grade = input::grade(req.grade)?;
        input::subject(&req.subject)?;

        let standards: Vec<MinistryStandard> = if req.expected_oa.is_empty() {
            Vec::new()
        } else {
            self.store
                .fetch_standards(&req.expected_oa, grade.value(), &req.subject)
                .await
                .map_err(|e| {
                    ServiceError::ValidationFailed(upstream("Standards lookup failed", e))
                })?
        };
        if standards.len() < req.expected_oa.len() {
            tracing::debug!(
                expected = req.expected_oa.len(),
                found = standards.len(),
                "some expected OA have no ministry standard"
            );
        }

        let prompt = build_rubric_prompt(
            &req.content,
            grade,
            &req.subject,
            &req.expected_oa,
            &standards,
        );
        let response = self
            .generator
            .generate(&prompt, VALIDATION_PARAMS)
            .await
            .map_err(|e| ServiceError::ValidationFailed(upstream("Rubric evaluation failed", e)))?;

        let rubric = parse_rubric(&response);
        if !rubric.missing.is_empty() {
            tracing::warn!(
                missing = ?rubric.missing,
                "rubric response incomplete; defaults applied"
            );
        }

        let score = rubric.score();
        let result = ValidationResult {
            is_valid: score >= PASS_THRESHOLD,
            score,
            validation_details: rubric.into_details(),
            validation_time_ms: elapsed_ms(start),
        };

        tracing::info!(
            grade = grade.value(),
            subject = %req.subject,
            score = result.score,
            is_valid = result.is_valid,
            validation_time_ms = result.validation_time_ms,
            "validation completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_score_extremes() {
        assert_eq!(weighted_score(100, 100, 100, 100), 100);
        assert_eq!(weighted_score(0, 0, 0, 0), 0);
    }

    #[test]
    fn test_weighted_score_rounding() {
        // 34 + 27 + 17.6 + 8 = 86.6
        assert_eq!(weighted_score(85, 90, 88, 80), 87);
        // 28 + 21 + 14 + 7 = 70.0 exactly
        assert_eq!(weighted_score(70, 70, 70, 70), 70);
        // 0.4·1 = 0.4 rounds down, 0.5 rounds up
        assert_eq!(weighted_score(1, 0, 0, 0), 0);
        assert_eq!(weighted_score(0, 0, 0, 5), 1);
    }

    #[test]
    fn test_parse_well_formed() {
        let text = "OA_SCORE: 85\nGRADE_SCORE: 90\nCHILEAN_SCORE: 88\nCOVERAGE_SCORE: 80\n\
                    ISSUES: falta un ejemplo, vocabulario avanzado\n\
                    RECOMMENDATIONS: agregar ejemplo con pesos chilenos";
        let r = parse_rubric(text);
        assert_eq!(
            (r.oa_alignment, r.grade_appropriate, r.chilean_terminology, r.learning_coverage),
            (85, 90, 88, 80)
        );
        assert_eq!(r.issues, vec!["falta un ejemplo", "vocabulario avanzado"]);
        assert_eq!(r.recommendations, vec!["agregar ejemplo con pesos chilenos"]);
        assert!(r.missing.is_empty());
    }

    #[test]
    fn test_parse_defaults_to_neutral() {
        let r = parse_rubric("No puedo evaluar este contenido.");
        assert_eq!(r.oa_alignment, 50);
        assert_eq!(r.learning_coverage, 50);
        assert_eq!(r.score(), 50);
        assert_eq!(r.issues, vec![NO_ISSUES_PLACEHOLDER]);
        assert_eq!(r.recommendations, vec![NO_RECOMMENDATIONS_PLACEHOLDER]);
        assert_eq!(r.missing.len(), 6);
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        let r = parse_rubric("OA_SCORE: 150\nGRADE_SCORE: -10\nCHILEAN_SCORE: 100\nCOVERAGE_SCORE: 0");
        assert_eq!(r.oa_alignment, 100);
        assert_eq!(r.grade_appropriate, 0);
        assert_eq!(r.chilean_terminology, 100);
        assert_eq!(r.learning_coverage, 0);
    }

    #[test]
    fn test_parse_saturates_oversized_scores() {
        let r = parse_rubric(
            "OA_SCORE: 99999999999999999999\nGRADE_SCORE: -99999999999999999999\n\
             CHILEAN_SCORE: 80\nCOVERAGE_SCORE: 80\nISSUES: ninguno\nRECOMMENDATIONS: ninguno",
        );
        assert_eq!(r.oa_alignment, 100);
        assert_eq!(r.grade_appropriate, 0);
        assert!(r.missing.is_empty());
    }

    #[test]
    fn test_section_ends_at_unknown_label() {
        let r = parse_rubric(
            "ISSUES: falta ejemplo, vocabulario\nNOTA: revisar\nRECOMMENDATIONS: ninguno",
        );
        assert_eq!(r.issues, vec!["falta ejemplo", "vocabulario"]);
        assert_eq!(r.recommendations, vec![NO_RECOMMENDATIONS_PLACEHOLDER]);
    }

    #[test]
    fn test_parse_ninguno_is_empty() {
        let r = parse_rubric("OA_SCORE: 90\nISSUES: Ninguno\nRECOMMENDATIONS: NINGUNO.");
        assert_eq!(r.issues, vec![NO_ISSUES_PLACEHOLDER]);
        assert_eq!(r.recommendations, vec![NO_RECOMMENDATIONS_PLACEHOLDER]);
        assert!(!r.missing.contains(&"ISSUES"));
    }

    #[test]
    fn test_parse_single_line_and_markdown() {
        let text = "**OA_SCORE:** 72 **GRADE_SCORE:** 64 CHILEAN_SCORE: 81 COVERAGE_SCORE: 77 \
                    ISSUES: uso de \"dólares\", ejemplos extranjeros RECOMMENDATIONS: usar pesos";
        let r = parse_rubric(text);
        assert_eq!(r.oa_alignment, 72);
        assert_eq!(r.grade_appropriate, 64);
        assert_eq!(r.issues, vec!["uso de \"dólares\"", "ejemplos extranjeros"]);
        assert_eq!(r.recommendations, vec!["usar pesos"]);
    }

    #[test]
    fn test_parse_bulleted_lists() {
        let text = "ISSUES:\n- frase confusa\n- falta contexto\nRECOMMENDATIONS:\n- simplificar";
        let r = parse_rubric(text);
        assert_eq!(r.issues, vec!["frase confusa", "falta contexto"]);
        assert_eq!(r.recommendations, vec!["simplificar"]);
    }
}
