//! User preferences storage
//!
//! Handles saving and loading user preferences to a JSON file
//! in the application config directory. Besides settings this holds the
//! draft prompt and current analysis, so one-shot commands pick up where the
//! previous invocation left off.

use crate::response::AnalysisResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// User preferences
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Preferences {
    /// Prompt currently in the editor
    #[serde(default)]
    pub draft_prompt: Option<String>,
    /// Analysis currently shown for the draft
    #[serde(default)]
    pub current_analysis: Option<AnalysisResult>,
    /// Custom location for saved images (None = use default)
    #[serde(default)]
    pub image_location: Option<PathBuf>,
}

/// Get the preferences file path
fn preferences_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ForgeIQ").join("preferences.json"))
}

/// Load preferences from disk
///
/// Returns default preferences if the file doesn't exist or can't be read
pub(crate) fn load_preferences() -> Preferences {
    match preferences_path() {
        Some(path) => load_preferences_from(&path),
        None => Preferences::default(),
    }
}

fn load_preferences_from(path: &Path) -> Preferences {
    if !path.exists() {
        return Preferences::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(prefs) => prefs,
            Err(e) => {
                error!("Failed to parse preferences: {}", e);
                Preferences::default()
            }
        },
        Err(e) => {
            error!("Failed to read preferences file: {}", e);
            Preferences::default()
        }
    }
}

/// Save preferences to disk
pub(crate) fn save_preferences(prefs: &Preferences) -> Result<(), PreferencesError> {
    let path = preferences_path().ok_or(PreferencesError::NoConfigDir)?;
    save_preferences_to(&path, prefs)
}

fn save_preferences_to(path: &Path, prefs: &Preferences) -> Result<(), PreferencesError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            info!("Created preferences directory: {:?}", parent);
        }
    }

    let json = serde_json::to_string_pretty(prefs)?;
    fs::write(path, json)?;
    info!("Saved preferences to: {:?}", path);

    Ok(())
}

/// Get the custom image location, if set
pub(crate) fn get_image_location() -> Option<PathBuf> {
    load_preferences().image_location
}

/// Set a custom image location
pub(crate) fn set_image_location(path: Option<PathBuf>) -> Result<(), PreferencesError> {
    let mut prefs = load_preferences();
    prefs.image_location = path;
    save_preferences(&prefs)
}

/// Get the default image location
pub(crate) fn default_image_location() -> Option<PathBuf> {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join("ForgeIQ"))
}

/// Persist the draft prompt and current analysis, keeping other settings
pub(crate) fn save_draft(
    prompt: &str,
    analysis: Option<&AnalysisResult>,
) -> Result<(), PreferencesError> {
    let mut prefs = load_preferences();
    prefs.draft_prompt = Some(prompt.to_string()).filter(|p| !p.is_empty());
    prefs.current_analysis = analysis.cloned();
    save_preferences(&prefs)
}

/// Preferences errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum PreferencesError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
