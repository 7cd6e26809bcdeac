//! Run a prompt directly, grounded with web search

use super::Simulator;
use crate::error::AdapterError;
use crate::gemini::messages::{GenerateContentRequest, Part, Tool};
use crate::gemini::normalize;
use crate::gemini::GeminiClient;
use crate::response::{SimulationResult, NO_SIMULATION_OUTPUT};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub(crate) struct GeminiSimulator {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiSimulator {
    pub(crate) fn new(client: Arc<GeminiClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl Simulator for GeminiSimulator {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn simulate(&self, prompt: &str) -> Result<SimulationResult, AdapterError> {
        let request =
            GenerateContentRequest::user(vec![Part::text(prompt)]).with_tool(Tool::google_search());

        let response = self.client.generate_content(&self.model, &request).await?;
        let citations = normalize::grounding_citations(&response);
        let output = normalize::response_text(&response)
            .unwrap_or_else(|| NO_SIMULATION_OUTPUT.to_string());

        debug!(citations = citations.len(), "Simulation finished");
        Ok(SimulationResult { output, citations })
    }
}
