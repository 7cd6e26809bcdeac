//! Credential storage for the Gemini API key
//!
//! Lookup order:
//! 1. `GEMINI_API_KEY` (or `API_KEY`) in the environment / `.env`
//! 2. macOS Keychain
//! 3. `credentials.json` in the ForgeIQ config directory (other platforms)
//!
//! # Security
//! - On macOS the key is stored encrypted in the OS keychain
//! - The fallback file is created with owner-only permissions on unix

use crate::error::KeychainError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

#[cfg(target_os = "macos")]
use security_framework::passwords::*;

#[cfg(not(target_os = "macos"))]
use std::path::PathBuf;

#[cfg(target_os = "macos")]
const SERVICE_NAME: &str = "com.forgeiq.cli";

/// Fixed key the credential is stored under
const CREDENTIAL_KEY: &str = "gemini_credentials";

/// Environment variables checked before persistent storage
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Gemini API credentials.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiCredentials {
    /// Gemini API key
    pub(crate) api_key: String,
}

impl Drop for GeminiCredentials {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

/// Where a credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CredentialSource {
    Environment,
    Stored,
}

/// Resolve credentials from the environment or persistent storage.
pub(crate) fn find_credentials() -> Result<(GeminiCredentials, CredentialSource), KeychainError> {
    if let Some(creds) = credentials_from_env(|name| std::env::var(name).ok()) {
        return Ok((creds, CredentialSource::Environment));
    }
    get_gemini_credentials().map(|creds| (creds, CredentialSource::Stored))
}

/// First non-blank API key among the known environment variables
fn credentials_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<GeminiCredentials> {
    API_KEY_ENV_VARS.iter().find_map(|name| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|api_key| GeminiCredentials { api_key })
    })
}

/// Reject obviously unusable keys before storing them
pub(crate) fn validate_api_key(raw: &str) -> Result<GeminiCredentials, KeychainError> {
    let api_key = raw.trim();
    if api_key.is_empty() {
        return Err(KeychainError::InvalidData("API key is empty".into()));
    }
    if api_key.chars().any(char::is_whitespace) {
        return Err(KeychainError::InvalidData(
            "API key must not contain whitespace".into(),
        ));
    }
    Ok(GeminiCredentials {
        api_key: api_key.to_string(),
    })
}

/// Store Gemini credentials securely in the keychain.
#[cfg(target_os = "macos")]
pub(crate) fn store_gemini_credentials(creds: &GeminiCredentials) -> Result<(), KeychainError> {
    let json = serde_json::to_string(creds).map_err(|e| {
        KeychainError::Store(format!("Failed to serialize Gemini credentials: {}", e))
    })?;

    // Delete existing item if present
    let _ = delete_generic_password(SERVICE_NAME, CREDENTIAL_KEY);

    set_generic_password(SERVICE_NAME, CREDENTIAL_KEY, json.as_bytes())
        .map_err(|e| KeychainError::Store(e.to_string()))
}

/// Retrieve Gemini credentials from keychain.
#[cfg(target_os = "macos")]
pub(crate) fn get_gemini_credentials() -> Result<GeminiCredentials, KeychainError> {
    let password = get_generic_password(SERVICE_NAME, CREDENTIAL_KEY)
        .map_err(|e| KeychainError::Retrieve(e.to_string()))?;

    let json = String::from_utf8(password.to_vec())
        .map_err(|e| KeychainError::InvalidData(e.to_string()))?;

    serde_json::from_str(&json).map_err(|e| {
        KeychainError::InvalidData(format!("Failed to deserialize Gemini credentials: {}", e))
    })
}

/// Delete Gemini credentials from keychain.
#[cfg(target_os = "macos")]
pub(crate) fn delete_gemini_credentials() -> Result<(), KeychainError> {
    delete_generic_password(SERVICE_NAME, CREDENTIAL_KEY)
        .map_err(|e| KeychainError::Delete(e.to_string()))
}

/// Credential file used where no OS keychain integration exists
#[cfg(not(target_os = "macos"))]
fn credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ForgeIQ").join(format!("{}.json", CREDENTIAL_KEY)))
}

#[cfg(not(target_os = "macos"))]
pub(crate) fn store_gemini_credentials(creds: &GeminiCredentials) -> Result<(), KeychainError> {
    let path = credentials_path()
        .ok_or_else(|| KeychainError::Store("Could not find config directory".into()))?;
    write_credentials_file(&path, creds)
}

#[cfg(not(target_os = "macos"))]
pub(crate) fn get_gemini_credentials() -> Result<GeminiCredentials, KeychainError> {
    let path = credentials_path()
        .ok_or_else(|| KeychainError::Retrieve("Could not find config directory".into()))?;
    read_credentials_file(&path)
}

#[cfg(not(target_os = "macos"))]
pub(crate) fn delete_gemini_credentials() -> Result<(), KeychainError> {
    let path = credentials_path()
        .ok_or_else(|| KeychainError::Delete("Could not find config directory".into()))?;
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(KeychainError::NotFound),
        Err(e) => Err(KeychainError::Delete(e.to_string())),
    }
}

#[cfg(not(target_os = "macos"))]
fn write_credentials_file(
    path: &std::path::Path,
    creds: &GeminiCredentials,
) -> Result<(), KeychainError> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| KeychainError::Store(e.to_string()))?;
    }

    let json = serde_json::to_string(creds).map_err(|e| {
        KeychainError::Store(format!("Failed to serialize Gemini credentials: {}", e))
    })?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| KeychainError::Store(e.to_string()))?;
    file.write_all(json.as_bytes())
        .map_err(|e| KeychainError::Store(e.to_string()))
}

#[cfg(not(target_os = "macos"))]
fn read_credentials_file(path: &std::path::Path) -> Result<GeminiCredentials, KeychainError> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(KeychainError::NotFound),
        Err(e) => return Err(KeychainError::Retrieve(e.to_string())),
    };

    serde_json::from_str(&json).map_err(|e| {
        KeychainError::InvalidData(format!("Failed to deserialize Gemini credentials: {}", e))
    })
}
