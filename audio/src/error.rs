use thiserror::Error;

/// Errors returned when decoding an audio resource.
///
/// Decode failures are client-input errors: they propagate unmodified to the
/// caller and are never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open audio resource: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized audio container: {0}")]
    Probe(String),

    #[error("no audio track in container")]
    NoAudioTrack,

    #[error("audio track does not declare a sample rate")]
    UnknownSampleRate,

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("audio resource is empty")]
    Empty,
}
