//! Session controller
//!
//! Owns the session state, the result cache and the adapters, and turns user
//! actions into [`Notice`]s. Adapter errors stop here: they are logged and
//! collapsed into a short message, never propagated or retried.

use super::state::{ActionKind, ActionStatus, Notice, SessionState};
use crate::adapters::Adapters;
use crate::audio::{AudioSource, CaptureHandle, CapturedAudio};
use crate::error::ValidationError;
use crate::history::{HistoryStore, PromptRecord};
use crate::prompts;
use crate::response::{AnalysisResult, GeneratedImage, ImageOutcome, SimulationResult};
use tracing::{info, warn};

pub(crate) const MSG_ANALYSIS_COMPLETE: &str = "Analysis complete!";
pub(crate) const MSG_ANALYSIS_FAILED: &str =
    "Failed to analyze prompt. Check your connection or API key.";
pub(crate) const MSG_TRANSCRIPTION_ADDED: &str = "Transcription added!";
pub(crate) const MSG_NO_SPEECH: &str = "No speech detected.";
pub(crate) const MSG_TRANSCRIPTION_FAILED: &str = "Failed to transcribe audio.";
pub(crate) const MSG_MICROPHONE_FAILED: &str = "Could not access microphone.";
pub(crate) const MSG_IMPROVED_APPLIED: &str = "Improved prompt applied!";
pub(crate) const MSG_EXAMPLE_LOADED: &str = "Example prompt loaded!";
pub(crate) const MSG_SIMULATION_FAILED: &str = "Error running simulation.";

pub(crate) struct SessionController {
    state: SessionState,
    history: HistoryStore,
    adapters: Option<Adapters>,
    audio: Box<dyn AudioSource>,
    recording: Option<Box<dyn CaptureHandle>>,
}

impl SessionController {
    /// Controller without adapters; they arrive once a credential is known
    pub(crate) fn new(history: HistoryStore, audio: Box<dyn AudioSource>) -> Self {
        Self {
            state: SessionState::default(),
            history,
            adapters: None,
            audio,
            recording: None,
        }
    }

    pub(crate) fn install_adapters(&mut self, adapters: Adapters) {
        self.adapters = Some(adapters);
    }

    // Accessors

    pub(crate) fn prompt(&self) -> &str {
        &self.state.prompt
    }

    pub(crate) fn current_analysis(&self) -> Option<&AnalysisResult> {
        self.state.current_analysis.as_ref()
    }

    pub(crate) fn images(&self) -> &[GeneratedImage] {
        &self.state.images
    }

    pub(crate) fn last_simulation(&self) -> Option<&SimulationResult> {
        self.state.last_simulation.as_ref()
    }

    pub(crate) fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub(crate) fn status(&self, kind: ActionKind) -> ActionStatus {
        self.state.status(kind)
    }

    pub(crate) fn is_pending(&self, kind: ActionKind) -> bool {
        self.status(kind) == ActionStatus::Pending
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    // Editor

    pub(crate) fn set_prompt(&mut self, text: impl Into<String>) {
        self.state.prompt = text.into();
    }

    pub(crate) fn clear_prompt(&mut self) {
        self.state.prompt.clear();
    }

    /// Current prompt and analysis, for carrying across invocations
    pub(crate) fn snapshot(&self) -> (String, Option<AnalysisResult>) {
        (
            self.state.prompt.clone(),
            self.state.current_analysis.clone(),
        )
    }

    pub(crate) fn restore(&mut self, prompt: String, analysis: Option<AnalysisResult>) {
        self.state.prompt = prompt;
        self.state.current_analysis = analysis;
    }

    /// Load example `number` (1-based) into the editor
    pub(crate) fn load_example(&mut self, number: usize) -> Notice {
        match prompts::example(number) {
            Some(example) => {
                self.state.prompt = example.prompt.to_string();
                Notice::info(MSG_EXAMPLE_LOADED)
            }
            None => Notice::Invalid(ValidationError::UnknownExample(number)),
        }
    }

    /// Replace the prompt with the current analysis' improved version
    pub(crate) fn apply_improved_prompt(&mut self) -> Notice {
        match &self.state.current_analysis {
            Some(analysis) => {
                self.state.prompt = analysis.improved_prompt.clone();
                Notice::success(MSG_IMPROVED_APPLIED)
            }
            None => Notice::Invalid(ValidationError::NothingToApply),
        }
    }

    /// Validate the prompt and credential before any network call
    fn checked_request(&self) -> Result<(String, Adapters), ValidationError> {
        let prompt = self.state.prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        let adapters = self
            .adapters
            .clone()
            .ok_or(ValidationError::MissingCredential)?;
        Ok((self.state.prompt.clone(), adapters))
    }

    // Analysis

    /// Put `text` in the editor and analyze it
    pub(crate) async fn submit_prompt(&mut self, text: impl Into<String>) -> Notice {
        self.state.prompt = text.into();
        self.analyze_current().await
    }

    /// Analyze whatever is in the editor
    ///
    /// On success the result becomes the current analysis and is recorded at
    /// the head of history.
    pub(crate) async fn analyze_current(&mut self) -> Notice {
        let (prompt, adapters) = match self.checked_request() {
            Ok(request) => request,
            Err(e) => return Notice::Invalid(e),
        };

        self.state.set_status(ActionKind::Analyze, ActionStatus::Pending);
        match adapters.analyzer.analyze(&prompt).await {
            Ok(analysis) => {
                let id = self
                    .history
                    .append(PromptRecord::new(prompt, analysis.clone()));
                info!(id = %id, score = analysis.quality_score, "Analysis stored");
                self.state.current_analysis = Some(analysis);
                self.state.set_status(ActionKind::Analyze, ActionStatus::Succeeded);
                Notice::success(MSG_ANALYSIS_COMPLETE)
            }
            Err(e) => {
                warn!("Analysis failed: {}", e);
                self.state.set_status(ActionKind::Analyze, ActionStatus::Failed);
                Notice::failed(MSG_ANALYSIS_FAILED)
            }
        }
    }

    // Dictation

    /// Open the microphone and start recording
    pub(crate) fn start_dictation(&mut self) -> Notice {
        if self.recording.is_some() {
            return Notice::Invalid(ValidationError::AlreadyRecording);
        }
        if self.adapters.is_none() {
            return Notice::Invalid(ValidationError::MissingCredential);
        }

        match self.audio.begin_capture() {
            Ok(handle) => {
                self.recording = Some(handle);
                self.state.set_status(ActionKind::Dictate, ActionStatus::Pending);
                Notice::info("Recording...")
            }
            Err(e) => {
                warn!("Microphone error: {}", e);
                self.state.set_status(ActionKind::Dictate, ActionStatus::Failed);
                Notice::failed(MSG_MICROPHONE_FAILED)
            }
        }
    }

    /// Stop recording and transcribe the clip into the prompt
    ///
    /// The device is released before the transcription request is sent.
    pub(crate) async fn stop_dictation(&mut self) -> Notice {
        let Some(handle) = self.recording.take() else {
            return Notice::Invalid(ValidationError::NotRecording);
        };

        let finished = tokio::task::spawn_blocking(move || handle.finish()).await;
        let clip = match finished {
            Ok(Ok(clip)) => clip,
            Ok(Err(e)) => {
                warn!("Capture failed: {}", e);
                self.state.set_status(ActionKind::Dictate, ActionStatus::Failed);
                return Notice::failed(MSG_MICROPHONE_FAILED);
            }
            Err(e) => {
                warn!("Capture task failed: {}", e);
                self.state.set_status(ActionKind::Dictate, ActionStatus::Failed);
                return Notice::failed(MSG_MICROPHONE_FAILED);
            }
        };

        self.transcribe_clip(clip).await
    }

    /// Stop recording without transcribing
    pub(crate) fn cancel_dictation(&mut self) -> Notice {
        match self.recording.take() {
            Some(handle) => {
                handle.cancel();
                self.state.set_status(ActionKind::Dictate, ActionStatus::Idle);
                Notice::info("Recording cancelled.")
            }
            None => Notice::Invalid(ValidationError::NotRecording),
        }
    }

    /// Transcribe an already captured clip and append the text to the prompt
    pub(crate) async fn transcribe_clip(&mut self, clip: CapturedAudio) -> Notice {
        let Some(adapters) = self.adapters.clone() else {
            return Notice::Invalid(ValidationError::MissingCredential);
        };

        self.state.set_status(ActionKind::Dictate, ActionStatus::Pending);
        match adapters.transcriber.transcribe(&clip).await {
            Ok(text) if text.trim().is_empty() => {
                self.state.set_status(ActionKind::Dictate, ActionStatus::Succeeded);
                Notice::info(MSG_NO_SPEECH)
            }
            Ok(text) => {
                self.state.append_to_prompt(text.trim());
                self.state.set_status(ActionKind::Dictate, ActionStatus::Succeeded);
                Notice::success(MSG_TRANSCRIPTION_ADDED)
            }
            Err(e) => {
                warn!("Transcription failed: {}", e);
                self.state.set_status(ActionKind::Dictate, ActionStatus::Failed);
                Notice::failed(MSG_TRANSCRIPTION_FAILED)
            }
        }
    }

    // Images

    /// Generate an image for the current prompt
    pub(crate) async fn generate_image(&mut self) -> Notice {
        let (prompt, adapters) = match self.checked_request() {
            Ok(request) => request,
            Err(e) => return Notice::Invalid(e),
        };

        self.state.set_status(ActionKind::Image, ActionStatus::Pending);
        let generator = adapters.image_generator;
        match generator.generate(&prompt).await {
            Ok(ImageOutcome::Image(image)) => {
                self.state.images.push(image);
                self.state.set_status(ActionKind::Image, ActionStatus::Succeeded);
                Notice::success("Image generated!")
            }
            Ok(ImageOutcome::Explanation(text)) => {
                self.state.set_status(ActionKind::Image, ActionStatus::Succeeded);
                Notice::Info(text)
            }
            Err(e) => {
                warn!("Image generation failed: {}", e);
                self.state.set_status(ActionKind::Image, ActionStatus::Failed);
                Notice::Failed(format!(
                    "Failed to generate image. Details: {}. Please check that your API key is valid and has access to '{}'.",
                    e,
                    generator.model()
                ))
            }
        }
    }

    // Simulation

    /// Run the current prompt against the model and keep the answer
    pub(crate) async fn run_simulation(&mut self) -> Notice {
        let (prompt, adapters) = match self.checked_request() {
            Ok(request) => request,
            Err(e) => return Notice::Invalid(e),
        };

        self.state.set_status(ActionKind::Simulate, ActionStatus::Pending);
        match adapters.simulator.simulate(&prompt).await {
            Ok(result) => {
                self.state.last_simulation = Some(result);
                self.state.set_status(ActionKind::Simulate, ActionStatus::Succeeded);
                Notice::success("Simulation complete!")
            }
            Err(e) => {
                warn!("Simulation failed: {}", e);
                self.state.set_status(ActionKind::Simulate, ActionStatus::Failed);
                Notice::failed(MSG_SIMULATION_FAILED)
            }
        }
    }

    // History

    /// Restore a history entry into the editor
    pub(crate) fn select_history(&mut self, id: &str) -> Notice {
        let Some(record) = self.history.get(id) else {
            return Notice::Invalid(ValidationError::UnknownHistoryId(id.to_string()));
        };
        self.state.prompt = record.original_prompt.clone();
        self.state.current_analysis = record.analysis.clone();
        Notice::info("Loaded prompt from history.")
    }

    pub(crate) fn delete_history(&mut self, id: &str) -> Notice {
        if self.history.remove(id) {
            Notice::success("History entry deleted.")
        } else {
            Notice::Invalid(ValidationError::UnknownHistoryId(id.to_string()))
        }
    }

    pub(crate) fn clear_history(&mut self) -> Notice {
        self.history.clear();
        Notice::success("History cleared.")
    }
}
