//! Adapters between the session and the Gemini service
//!
//! Each port is a stateless request/response trait; the Gemini-backed
//! implementations share one [`GeminiClient`]. The session controller only
//! sees the traits, so tests can swap in fakes.

mod analysis;
mod image;
mod simulation;
mod transcription;

pub(crate) use analysis::GeminiAnalyzer;
pub(crate) use image::GeminiImageGenerator;
pub(crate) use simulation::GeminiSimulator;
pub(crate) use transcription::GeminiTranscriber;

use crate::audio::CapturedAudio;
use crate::config::GeminiConfig;
use crate::error::AdapterError;
use crate::gemini::GeminiClient;
use crate::keychain::GeminiCredentials;
use crate::response::{AnalysisResult, ImageOutcome, SimulationResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Scores a prompt and proposes an improved version
#[async_trait]
pub(crate) trait PromptAnalyzer: Send + Sync {
    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, AdapterError>;
}

/// Turns a recorded clip into text
///
/// An empty string means the service heard no speech.
#[async_trait]
pub(crate) trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &CapturedAudio) -> Result<String, AdapterError>;
}

/// Renders an image for a prompt
#[async_trait]
pub(crate) trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ImageOutcome, AdapterError>;

    /// Model name shown in failure messages
    fn model(&self) -> &str;
}

/// Runs a prompt as-is and returns the model's answer
#[async_trait]
pub(crate) trait Simulator: Send + Sync {
    async fn simulate(&self, prompt: &str) -> Result<SimulationResult, AdapterError>;
}

/// The full set of adapters a session needs
#[derive(Clone)]
pub(crate) struct Adapters {
    pub(crate) analyzer: Arc<dyn PromptAnalyzer>,
    pub(crate) transcriber: Arc<dyn Transcriber>,
    pub(crate) image_generator: Arc<dyn ImageGenerator>,
    pub(crate) simulator: Arc<dyn Simulator>,
}

impl Adapters {
    /// Gemini-backed adapters sharing one HTTP client
    pub(crate) fn gemini(
        config: &GeminiConfig,
        creds: &GeminiCredentials,
    ) -> anyhow::Result<Self> {
        let client = Arc::new(GeminiClient::new(config, creds)?);
        Ok(Self {
            analyzer: Arc::new(GeminiAnalyzer::new(
                client.clone(),
                config.analysis_model.clone(),
            )),
            transcriber: Arc::new(GeminiTranscriber::new(
                client.clone(),
                config.transcription_model.clone(),
            )),
            image_generator: Arc::new(GeminiImageGenerator::new(
                client.clone(),
                config.image_model.clone(),
            )),
            simulator: Arc::new(GeminiSimulator::new(
                client,
                config.simulation_model.clone(),
            )),
        })
    }
}
