//! Generate stage: prompt building and one generation-model call.

use std::time::Instant;

use crate::error::{upstream, ServiceError};
use crate::input;
use crate::models::{elapsed_ms, GenerationRequest, GenerationResult};
use crate::prompt::{build_generation_prompt, GenerationPrompt, Style};
use crate::service::CurriculumService;
use crate::traits::GenerationParams;

/// Sampling parameters for tutoring answers.
pub const GENERATION_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 500,
    temperature: 0.7,
};

impl CurriculumService {
    pub async fn generate(
        &self,
        req: &GenerationRequest,
    ) -> Result<GenerationResult, ServiceError> {
        let start = Instant::now();

        input::min_chars(&req.context, 10, "context", ServiceError::InvalidContext)?;
        input::min_chars(&req.query, 3, "query", ServiceError::InvalidQuery)?;
        let grade = input::grade(req.grade)?;
        input::subject(&req.subject)?;

        let style = Style::from_name(req.style.as_deref());
        let prompt = build_generation_prompt(&GenerationPrompt {
            context: &req.context,
            query: &req.query,
            grade,
            subject: &req.subject,
            oa_codes: &req.oa_codes,
            style,
        });

        let text = self
            .generator
            .generate(&prompt, GENERATION_PARAMS)
            .await
            .map_err(|e| ServiceError::GenerationFailed(upstream("Generation model failed", e)))?;
        if text.trim().is_empty() {
            return Err(ServiceError::GenerationFailed(
                "Generation model returned an empty response".to_string(),
            ));
        }

        let result = GenerationResult {
            generated_text: text,
            oa_codes: req.oa_codes.clone(),
            model_used: self.generator.model_name().to_string(),
            generation_time_ms: elapsed_ms(start),
        };

        tracing::info!(
            grade = grade.value(),
            subject = %req.subject,
            ?style,
            model = %result.model_used,
            generation_time_ms = result.generation_time_ms,
            "generation completed"
        );
        Ok(result)
    }
}
