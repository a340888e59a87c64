/// Result alias that carries the custom [`VizError`] type.
pub type Result<T> = std::result::Result<T, VizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// Free-form error used for conditions that do not need a dedicated
    /// variant (poisoned locks, missing devices by name, and so on).
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Input that violates an API precondition.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// FFT processing failure from the realfft backend.
    #[error("fft processing failed: {0}")]
    Fft(#[from] realfft::FftError),
    /// Configuration could not be parsed or serialized.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
    /// The audio backend could not enumerate devices.
    #[error("audio device enumeration failed: {0}")]
    Devices(#[from] cpal::DevicesError),
    /// The selected capture device refused a default stream config.
    #[error("capture device has no usable stream config: {0}")]
    StreamConfig(#[from] cpal::DefaultStreamConfigError),
    /// The capture stream could not be built against the device.
    #[error("failed to open capture stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    /// The capture stream could not be started.
    #[error("failed to start capture stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

impl VizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for VizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
