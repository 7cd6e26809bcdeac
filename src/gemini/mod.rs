//! Gemini REST client
//!
//! Thin wrapper over `models/{model}:generateContent`. The adapters build the
//! request bodies and use [`normalize`] to read the responses; this module only
//! owns the HTTP plumbing and error mapping. Requests are never retried.

pub(crate) mod messages;
pub(crate) mod normalize;

use crate::config::GeminiConfig;
use crate::error::AdapterError;
use crate::keychain::GeminiCredentials;
use anyhow::Context;
use messages::{GenerateContentRequest, GenerateContentResponse};
use tracing::{debug, instrument, warn};
use zeroize::Zeroize;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// API version prefix of the REST endpoint
const API_VERSION: &str = "v1beta";

/// Client for Gemini `generateContent` calls.
pub(crate) struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client from configuration and credentials.
    pub(crate) fn new(config: &GeminiConfig, creds: &GeminiCredentials) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("Failed to create HTTP client for GeminiClient")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: creds.api_key.clone(),
            client,
        })
    }

    /// URL of the generateContent method for a model
    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, API_VERSION, model
        )
    }

    /// Send one generateContent request.
    ///
    /// Non-success statuses become [`AdapterError::ServerError`] and a prompt
    /// the service refused outright becomes [`AdapterError::Blocked`].
    #[instrument(skip(self, request), fields(model = %model))]
    pub(crate) async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AdapterError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Gemini request failed");
            return Err(AdapterError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            AdapterError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        if let Some(reason) = normalize::block_reason(&body) {
            warn!(reason = %reason, "Gemini blocked the prompt");
            return Err(AdapterError::Blocked(reason));
        }

        debug!(candidates = body.candidates.len(), "Gemini response received");
        Ok(body)
    }
}

impl Drop for GeminiClient {
    fn drop(&mut self) {
        // Clear API key from memory
        self.api_key.zeroize();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::load_config;
    use messages::Part;
    use mockito::{Matcher, Server};

    /// Client pointed at a mock server
    pub(crate) fn test_client(base_url: &str) -> GeminiClient {
        let mut config = load_config().expect("config").gemini;
        config.base_url = base_url.to_string();
        let creds = GeminiCredentials {
            api_key: "test-key".to_string(),
        };
        GeminiClient::new(&config, &creds).expect("client")
    }

    #[test]
    fn test_endpoint_format() {
        let client = test_client("https://generativelanguage.googleapis.com/");
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/m1:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "hello"}]}}]}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let request = GenerateContentRequest::user(vec![Part::text("hi")]);
        let response = client
            .generate_content("m1", &request)
            .await
            .expect("request should succeed");

        mock.assert_async().await;
        assert_eq!(normalize::response_text(&response).as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_generate_content_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/m1:generateContent")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let request = GenerateContentRequest::user(vec![Part::text("hi")]);
        match client.generate_content("m1", &request).await {
            Err(AdapterError::ServerError { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected server error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_generate_content_invalid_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/m1:generateContent")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let request = GenerateContentRequest::user(vec![Part::text("hi")]);
        let result = client.generate_content("m1", &request).await;
        assert!(matches!(result, Err(AdapterError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_content_blocked() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/m1:generateContent")
            .with_status(200)
            .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let request = GenerateContentRequest::user(vec![Part::text("hi")]);
        let result = client.generate_content("m1", &request).await;
        assert!(matches!(result, Err(AdapterError::Blocked(reason)) if reason == "SAFETY"));
    }
}
