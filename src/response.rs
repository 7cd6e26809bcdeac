//! Structured results returned by the adapters
//!
//! These are the local types the Gemini responses are normalized into.
//! `AnalysisResult` is also what the result cache persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty level assigned to a prompt by the analysis model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub(crate) const ALL: [&'static str; 3] = ["Beginner", "Intermediate", "Advanced"];
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner => write!(f, "Beginner"),
            DifficultyLevel::Intermediate => write!(f, "Intermediate"),
            DifficultyLevel::Advanced => write!(f, "Advanced"),
        }
    }
}

/// Critique of a single prompt
///
/// Field names follow the wire schema requested from the model. The short
/// `score`/`level` names are accepted too, since the model does not always
/// honour the schema exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalysisResult {
    /// 0 to 10 inclusive
    #[serde(alias = "score")]
    pub(crate) quality_score: u8,
    #[serde(alias = "level")]
    pub(crate) difficulty_level: DifficultyLevel,
    pub(crate) summary: String,
    #[serde(default)]
    pub(crate) strengths: Vec<String>,
    #[serde(default)]
    pub(crate) weaknesses: Vec<String>,
    #[serde(default)]
    pub(crate) suggestions: Vec<String>,
    pub(crate) improved_prompt: String,
}

/// Highest score the analysis model may assign
pub(crate) const MAX_QUALITY_SCORE: u8 = 10;

/// A source the service attached to a grounded text response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Citation {
    pub(crate) title: String,
    pub(crate) uri: String,
}

/// Output of running a prompt directly against the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SimulationResult {
    pub(crate) output: String,
    pub(crate) citations: Vec<Citation>,
}

/// Fallback output when the service returns no text for a simulation
pub(crate) const NO_SIMULATION_OUTPUT: &str = "No output generated.";

/// An image produced by the image adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GeneratedImage {
    /// `data:` URI for inline payloads, or an external URL
    pub(crate) url: String,
    pub(crate) prompt: String,
    pub(crate) created_at: DateTime<Utc>,
}

/// Outcome of an image request that reached the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ImageOutcome {
    Image(GeneratedImage),
    /// The model answered with text only (e.g. a refusal); shown verbatim
    Explanation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_result_camel_case_round_trip() {
        let json = r#"{
            "qualityScore": 7,
            "difficultyLevel": "Intermediate",
            "summary": "Clear but thin",
            "strengths": ["concise"],
            "weaknesses": ["no imagery constraint"],
            "suggestions": ["specify syllable structure"],
            "improvedPrompt": "Write a traditional 5-7-5 haiku about rain."
        }"#;
        let parsed: AnalysisResult = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(parsed.quality_score, 7);
        assert_eq!(parsed.difficulty_level, DifficultyLevel::Intermediate);

        let serialized = serde_json::to_string(&parsed).unwrap();
        assert!(serialized.contains("\"qualityScore\":7"));
        assert!(serialized.contains("\"improvedPrompt\""));
    }

    #[test]
    fn test_analysis_result_accepts_short_field_names() {
        let json = r#"{
            "score": 3,
            "level": "Beginner",
            "summary": "s",
            "strengths": [],
            "weaknesses": ["vague"],
            "suggestions": [],
            "improvedPrompt": "p"
        }"#;
        let parsed: AnalysisResult = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(parsed.quality_score, 3);
        assert_eq!(parsed.difficulty_level, DifficultyLevel::Beginner);
        assert_eq!(parsed.weaknesses, vec!["vague".to_string()]);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let json = r#"{"score": 3, "level": "Expert", "summary": "s", "improvedPrompt": "p"}"#;
        assert!(serde_json::from_str::<AnalysisResult>(json).is_err());
    }

    #[test]
    fn test_difficulty_display() {
        assert_eq!(DifficultyLevel::Advanced.to_string(), "Advanced");
        assert_eq!(DifficultyLevel::ALL.len(), 3);
    }
}
