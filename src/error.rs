use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by the Gemini adapters (network, service or response shape)
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("No text content in response")]
    EmptyResponse,

    #[error("Request blocked by the service: {0}")]
    Blocked(String),
}

/// User-correctable problems detected before any network I/O
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a prompt to analyze.")]
    EmptyPrompt,

    #[error("No API key configured. Run `forgeiq login` to add one.")]
    MissingCredential,

    #[error("There is no improved prompt to apply yet.")]
    NothingToApply,

    #[error("No history entry with id {0}")]
    UnknownHistoryId(String),

    #[error("Already recording.")]
    AlreadyRecording,

    #[error("Not recording.")]
    NotRecording,

    #[error("No example prompt number {0}")]
    UnknownExample(usize),
}

/// Local persistence errors (never surfaced to the user, only logged)
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Could not find data directory")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
}

/// Keychain-related errors
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Failed to store credentials: {0}")]
    Store(String),

    #[error("Failed to retrieve credentials: {0}")]
    Retrieve(String),

    #[error("Failed to delete credentials: {0}")]
    Delete(String),

    #[error("Invalid credential data: {0}")]
    InvalidData(String),

    #[error("No credentials stored")]
    NotFound,
}
