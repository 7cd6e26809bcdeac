//! Image generation

use super::ImageGenerator;
use crate::error::AdapterError;
use crate::gemini::messages::{GenerateContentRequest, GenerationConfig, ImageConfig, Part};
use crate::gemini::normalize;
use crate::gemini::GeminiClient;
use crate::response::{GeneratedImage, ImageOutcome};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const ASPECT_RATIO: &str = "1:1";

pub(crate) struct GeminiImageGenerator {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiImageGenerator {
    pub(crate) fn new(client: Arc<GeminiClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    /// Generate one square image
    ///
    /// A text-only answer (typically a refusal) is returned as
    /// [`ImageOutcome::Explanation`]; a response with neither is an error.
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<ImageOutcome, AdapterError> {
        let request = GenerateContentRequest::user(vec![Part::text(prompt)]).with_config(
            GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: ASPECT_RATIO.to_string(),
                }),
                ..GenerationConfig::default()
            },
        );

        let response = self.client.generate_content(&self.model, &request).await?;

        if let Some(url) = normalize::inline_image(&response) {
            info!("Image received");
            return Ok(ImageOutcome::Image(GeneratedImage {
                url,
                prompt: prompt.to_string(),
                created_at: Utc::now(),
            }));
        }

        match normalize::response_text(&response) {
            Some(text) => {
                warn!("Image model answered with text only");
                Ok(ImageOutcome::Explanation(text))
            }
            None => Err(AdapterError::InvalidResponse(
                "No image data returned from API".to_string(),
            )),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
