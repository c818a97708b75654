#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no input device named {0:?}")]
    DeviceNotFound(String),
    #[error("no default input device available")]
    NoDefaultDevice,
    #[error("audio device error: {0}")]
    Device(String),
    #[error("failed to read audio file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid WAV data: {0}")]
    Wav(#[from] hound::Error),
    #[error("recording is empty")]
    Empty,
}
