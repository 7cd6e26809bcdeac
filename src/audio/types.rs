//! Audio capture types and error definitions

use std::path::Path;

/// Media type of clips recorded from the microphone
pub(crate) const WAV_MIME: &str = "audio/wav";

/// Media type assumed for clip files whose extension says nothing
pub(crate) const FALLBACK_AUDIO_MIME: &str = "audio/webm";

/// A finished recording, ready to be transcribed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CapturedAudio {
    /// Encoded clip (container included)
    pub(crate) bytes: Vec<u8>,
    /// Media type hint sent alongside the bytes
    pub(crate) mime_type: String,
}

impl CapturedAudio {
    pub(crate) fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Load an existing clip, guessing its media type from the extension
    pub(crate) fn from_file(path: &Path) -> Result<Self, CaptureError> {
        let bytes = std::fs::read(path)?;
        let mime_type = mime_guess::from_path(path)
            .first()
            .filter(|mime| mime.type_().as_str() == "audio")
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_AUDIO_MIME.to_string());
        Ok(Self { bytes, mime_type })
    }
}

/// An in-progress recording
///
/// The device is held until the handle is finished, cancelled or dropped.
pub(crate) trait CaptureHandle: Send {
    /// Stop recording and return the encoded clip
    fn finish(self: Box<Self>) -> Result<CapturedAudio, CaptureError>;

    /// Stop recording and discard what was captured
    fn cancel(self: Box<Self>);
}

/// Something that can start a recording (the microphone, or a fake in tests)
pub(crate) trait AudioSource: Send + Sync {
    fn begin_capture(&self) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}

/// Errors that can occur during audio capture
#[derive(Debug, thiserror::Error)]
pub(crate) enum CaptureError {
    #[error("No audio input device found")]
    NoInputDevice,

    #[error("No supported audio configuration found")]
    NoSupportedConfig,

    #[error("Audio configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio device error: {0}")]
    DeviceError(#[from] cpal::DevicesError),

    #[error("Audio stream error: {0}")]
    StreamError(#[from] cpal::BuildStreamError),

    #[error("Audio play error: {0}")]
    PlayError(#[from] cpal::PlayStreamError),

    #[error("Default config error: {0}")]
    DefaultConfigError(#[from] cpal::DefaultStreamConfigError),

    #[error("Capture thread exited unexpectedly")]
    ThreadExited,

    #[error("WAV encoding error: {0}")]
    Encode(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_guesses_audio_mime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let clip = CapturedAudio::from_file(&path).expect("load");
        assert_eq!(clip.bytes, b"RIFF");
        assert!(clip.mime_type.starts_with("audio/"));
    }

    #[test]
    fn test_from_file_falls_back_to_webm() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clip.unknownext");
        std::fs::write(&path, b"data").unwrap();
        assert_eq!(
            CapturedAudio::from_file(&path).expect("load").mime_type,
            FALLBACK_AUDIO_MIME
        );

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"data").unwrap();
        assert_eq!(
            CapturedAudio::from_file(&text).expect("load").mime_type,
            FALLBACK_AUDIO_MIME
        );
    }

    #[test]
    fn test_from_file_missing() {
        let result = CapturedAudio::from_file(Path::new("/definitely/not/here.wav"));
        assert!(matches!(result, Err(CaptureError::Io(_))));
    }
}
