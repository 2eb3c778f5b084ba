use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera or microphone permission denied")]
    PermissionDenied,

    #[error("a recording session is already live")]
    AlreadyRecording,

    #[error("no recording session is live")]
    NotRecording,

    #[error("capture device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
