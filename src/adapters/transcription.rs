//! Speech-to-text with audio sent inline

use super::Transcriber;
use crate::audio::CapturedAudio;
use crate::error::AdapterError;
use crate::gemini::messages::{GenerateContentRequest, Part};
use crate::gemini::normalize;
use crate::gemini::GeminiClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

const TRANSCRIPTION_INSTRUCTION: &str = "Please transcribe the following audio. \
Return only the transcribed text, no additional commentary or description.";

pub(crate) struct GeminiTranscriber {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiTranscriber {
    pub(crate) fn new(client: Arc<GeminiClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    #[instrument(skip(self, audio), fields(model = %self.model, bytes = audio.bytes.len(), mime = %audio.mime_type))]
    async fn transcribe(&self, audio: &CapturedAudio) -> Result<String, AdapterError> {
        let request = GenerateContentRequest::user(vec![
            Part::inline(audio.mime_type.clone(), &audio.bytes),
            Part::text(TRANSCRIPTION_INSTRUCTION),
        ]);

        let response = self.client.generate_content(&self.model, &request).await?;

        // Silence comes back as no text at all
        let text = normalize::response_text(&response)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        debug!(chars = text.len(), "Transcription received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::tests::test_client;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const ENDPOINT: &str = "/v1beta/models/stt-model:generateContent";

    fn transcriber(server: &Server) -> GeminiTranscriber {
        GeminiTranscriber::new(Arc::new(test_client(&server.url())), "stt-model".to_string())
    }

    #[tokio::test]
    async fn test_transcribe_sends_inline_audio() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", ENDPOINT)
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "audio/wav", "data": "AQID"}},
                    {"text": TRANSCRIPTION_INSTRUCTION}
                ]}]
            })))
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": " hello there \n"}]}}]}"#)
            .create_async()
            .await;

        let clip = CapturedAudio::new(vec![1, 2, 3], "audio/wav");
        let text = transcriber(&server).transcribe(&clip).await.expect("text");

        mock.assert_async().await;
        assert_eq!(text, "hello there");
    }

    #[tokio::test]
    async fn test_transcribe_silence_is_empty_string() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", ENDPOINT)
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": []}}]}"#)
            .create_async()
            .await;

        let clip = CapturedAudio::new(vec![0; 8], "audio/wav");
        let text = transcriber(&server).transcribe(&clip).await.expect("text");
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_transcribe_service_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", ENDPOINT)
            .with_status(500)
            .create_async()
            .await;

        let clip = CapturedAudio::new(vec![0; 8], "audio/wav");
        let result = transcriber(&server).transcribe(&clip).await;
        assert!(matches!(result, Err(AdapterError::ServerError { status: 500, .. })));
    }
}
