//! In-memory session state and user notices

use crate::error::ValidationError;
use crate::response::{AnalysisResult, GeneratedImage, SimulationResult};
use std::fmt;

/// Independently tracked action categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ActionKind {
    Analyze,
    Dictate,
    Image,
    Simulate,
}

impl ActionKind {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            ActionKind::Analyze => 0,
            ActionKind::Dictate => 1,
            ActionKind::Image => 2,
            ActionKind::Simulate => 3,
        }
    }
}

/// Lifecycle of the latest action in a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ActionStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// User-facing outcome of a controller action
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    Success(String),
    Info(String),
    /// Rejected before any network I/O
    Invalid(ValidationError),
    Failed(String),
}

impl Notice {
    pub(crate) fn success(message: impl Into<String>) -> Self {
        Notice::Success(message.into())
    }

    pub(crate) fn info(message: impl Into<String>) -> Self {
        Notice::Info(message.into())
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Notice::Failed(message.into())
    }

    pub(crate) fn is_error(&self) -> bool {
        matches!(self, Notice::Invalid(_) | Notice::Failed(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Success(msg) | Notice::Info(msg) | Notice::Failed(msg) => f.write_str(msg),
            Notice::Invalid(err) => write!(f, "{}", err),
        }
    }
}

/// Everything the surface shows besides history
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) prompt: String,
    pub(crate) current_analysis: Option<AnalysisResult>,
    /// Generated this session only, never persisted
    pub(crate) images: Vec<GeneratedImage>,
    pub(crate) last_simulation: Option<SimulationResult>,
    statuses: [ActionStatus; ActionKind::COUNT],
}

impl SessionState {
    pub(crate) fn status(&self, kind: ActionKind) -> ActionStatus {
        self.statuses[kind.index()]
    }

    pub(crate) fn set_status(&mut self, kind: ActionKind, status: ActionStatus) {
        self.statuses[kind.index()] = status;
    }

    /// Append dictated text, separated by a space when the prompt has content
    pub(crate) fn append_to_prompt(&mut self, text: &str) {
        if !self.prompt.trim().is_empty() {
            self.prompt.push(' ');
        }
        self.prompt.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_are_independent() {
        let mut state = SessionState::default();
        state.set_status(ActionKind::Analyze, ActionStatus::Pending);
        state.set_status(ActionKind::Image, ActionStatus::Failed);

        assert_eq!(state.status(ActionKind::Analyze), ActionStatus::Pending);
        assert_eq!(state.status(ActionKind::Dictate), ActionStatus::Idle);
        assert_eq!(state.status(ActionKind::Image), ActionStatus::Failed);
        assert_eq!(state.status(ActionKind::Simulate), ActionStatus::Idle);
    }

    #[test]
    fn test_append_to_prompt_spacing() {
        let mut state = SessionState::default();
        state.append_to_prompt("hello");
        assert_eq!(state.prompt, "hello");
        state.append_to_prompt("world");
        assert_eq!(state.prompt, "hello world");

        let mut blank = SessionState {
            prompt: "  ".to_string(),
            ..SessionState::default()
        };
        blank.append_to_prompt("text");
        assert_eq!(blank.prompt, "  text");
    }

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::success("Done").to_string(), "Done");
        assert_eq!(
            Notice::Invalid(ValidationError::EmptyPrompt).to_string(),
            "Please enter a prompt to analyze."
        );
        assert!(Notice::failed("x").is_error());
        assert!(!Notice::info("x").is_error());
    }
}
