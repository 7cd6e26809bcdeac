//! Prompt analysis via structured JSON output

use super::PromptAnalyzer;
use crate::error::AdapterError;
use crate::gemini::messages::{GenerateContentRequest, GenerationConfig, Part};
use crate::gemini::normalize;
use crate::gemini::GeminiClient;
use crate::response::{AnalysisResult, DifficultyLevel};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Analyzer backed by a Gemini text model
pub(crate) struct GeminiAnalyzer {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiAnalyzer {
    pub(crate) fn new(client: Arc<GeminiClient>, model: String) -> Self {
        Self { client, model }
    }
}

/// Instruction wrapped around the user's prompt
pub(crate) fn analysis_instruction(prompt: &str) -> String {
    format!(
        "You are an expert Prompt Engineer. Analyze the following LLM prompt.\n\n\
         Prompt: \"{}\"\n\n\
         Provide a score (0-10), difficulty level, critique, and a concrete improved version.",
        prompt
    )
}

/// Response schema the model is asked to follow
pub(crate) fn analysis_schema() -> serde_json::Value {
    let string_list = json!({"type": "ARRAY", "items": {"type": "STRING"}});
    json!({
        "type": "OBJECT",
        "properties": {
            "qualityScore": {"type": "INTEGER"},
            "difficultyLevel": {"type": "STRING", "enum": DifficultyLevel::ALL},
            "summary": {"type": "STRING"},
            "strengths": string_list,
            "weaknesses": string_list,
            "suggestions": string_list,
            "improvedPrompt": {"type": "STRING"}
        },
        "required": [
            "qualityScore",
            "difficultyLevel",
            "summary",
            "strengths",
            "weaknesses",
            "suggestions",
            "improvedPrompt"
        ]
    })
}

#[async_trait]
impl PromptAnalyzer for GeminiAnalyzer {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, AdapterError> {
        let request = GenerateContentRequest::user(vec![Part::text(analysis_instruction(prompt))])
            .with_config(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(analysis_schema()),
                ..GenerationConfig::default()
            });

        let response = self.client.generate_content(&self.model, &request).await?;
        let text = normalize::response_text(&response).ok_or(AdapterError::EmptyResponse)?;
        let analysis = normalize::parse_analysis(&text)?;

        debug!(score = analysis.quality_score, "Analysis parsed");
        Ok(analysis)
    }
}
