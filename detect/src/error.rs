use candor_audio::DecodeError;
use candor_classifier::{InferenceError, SchemaError};
use thiserror::Error;

/// Pipeline failures, by stage.
///
/// Decode and schema errors pass through unchanged; classifier failures are
/// caught once at the inference boundary and carried as a message. Nothing
/// here is retried: each failure is deterministic for its input.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The audio resource could not be decoded. Client-input class.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The classifier artifact is unusable. Fatal at startup.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The classifier rejected the aligned row.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<InferenceError> for DetectError {
    fn from(e: InferenceError) -> Self {
        DetectError::Inference(e.to_string())
    }
}
