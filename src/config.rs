//! Application configuration
//!
//! Defaults come from the embedded `config.toml`. A handful of values can be
//! overridden from the environment (after `.env` has been loaded).

use crate::error::AppError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const CONFIG_TOML: &str = include_str!("../config.toml");

/// Environment variable overriding the Gemini base URL
const BASE_URL_ENV: &str = "FORGEIQ_BASE_URL";

/// Environment variable overriding the history cap
const HISTORY_MAX_ENV: &str = "FORGEIQ_HISTORY_MAX";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Config {
    pub(crate) gemini: GeminiConfig,
    pub(crate) history: HistoryConfig,
}

/// Gemini endpoint and model selection
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeminiConfig {
    pub(crate) base_url: String,
    pub(crate) analysis_model: String,
    pub(crate) transcription_model: String,
    pub(crate) simulation_model: String,
    pub(crate) image_model: String,
    pub(crate) connect_timeout_secs: u64,
    /// No overall timeout is applied unless this is set
    #[serde(default)]
    pub(crate) request_timeout_secs: Option<u64>,
}

impl GeminiConfig {
    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub(crate) fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Result cache settings
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryConfig {
    pub(crate) max_entries: usize,
}

/// Load configuration from the embedded config.toml and apply environment overrides
pub(crate) fn load_config() -> Result<Config, AppError> {
    let mut config = parse_config(CONFIG_TOML)?;

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        info!(base_url = %base_url, "Using Gemini base URL from environment");
        config.gemini.base_url = base_url;
    }

    if let Ok(raw) = std::env::var(HISTORY_MAX_ENV) {
        match raw.parse::<usize>() {
            Ok(max) => config.history.max_entries = max,
            Err(e) => warn!("Ignoring invalid {}={:?}: {}", HISTORY_MAX_ENV, raw, e),
        }
    }

    validate(&config)?;
    Ok(config)
}

fn parse_config(raw: &str) -> Result<Config, AppError> {
    toml::from_str(raw).map_err(|e| AppError::Config(e.to_string()))
}

fn validate(config: &Config) -> Result<(), AppError> {
    url::Url::parse(&config.gemini.base_url)
        .map_err(|e| AppError::Config(format!("invalid base_url: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_parses() {
        let config = parse_config(CONFIG_TOML).expect("embedded config must parse");
        assert_eq!(config.history.max_entries, 50);
        assert_eq!(config.gemini.analysis_model, "gemini-2.5-flash");
        assert_eq!(config.gemini.image_model, "gemini-2.5-flash-image");
        assert!(config.gemini.request_timeout().is_none());
        assert_eq!(config.gemini.connect_timeout(), Duration::from_secs(10));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = parse_config(CONFIG_TOML).unwrap();
        config.gemini.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let result = parse_config("[history]\nmax_entries = 5\n");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
