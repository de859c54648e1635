use thiserror::Error;

pub type Result<T, E = CaptureError> = core::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("speech recognition not supported: {0}")]
    Unsupported(&'static str),
    #[error("capture session already active")]
    AlreadyActive,
    #[error("capture device error: {0}")]
    Device(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("cannot speak empty text")]
    EmptyText,
    #[error("speech engine error: {0}")]
    Engine(String),
}
