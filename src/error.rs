use thiserror::Error;

/// Custom error type for subpulse operations.
#[derive(Debug, Clone, Error)]
pub enum SubpulseError {
    /// A persisted artifact (vocabulary, labels, model config, weights) failed
    /// to load or does not fit the other artifacts.
    #[error("Failed to load {artifact}: {message}")]
    Load { artifact: String, message: String },

    /// Aggregation was requested over zero comments.
    #[error("Cannot aggregate an empty set of comments")]
    EmptyInput,

    /// The forum data source failed (network, HTTP status, private community).
    #[error("Upstream fetch failed for r/{community}: {message}")]
    UpstreamFetch { community: String, message: String },

    /// The classifier is not loaded; no prediction may be attempted.
    #[error("Sentiment model is not loaded")]
    ModelUnavailable,

    /// Inference ran but failed or returned malformed output.
    #[error("Inference error: {0}")]
    Inference(String),

    /// A bounded operation exceeded its deadline.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration is malformed or incomplete.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File or CSV I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl SubpulseError {
    /// Shorthand for a [`SubpulseError::Load`] error.
    pub fn load(artifact: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SubpulseError::Load {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }

    /// Shorthand for a [`SubpulseError::UpstreamFetch`] error.
    pub fn upstream(community: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SubpulseError::UpstreamFetch {
            community: community.into(),
            message: message.to_string(),
        }
    }
}

impl From<std::io::Error> for SubpulseError {
    fn from(err: std::io::Error) -> Self {
        SubpulseError::Io(err.to_string())
    }
}

impl From<csv::Error> for SubpulseError {
    fn from(err: csv::Error) -> Self {
        SubpulseError::Io(format!("CSV error: {}", err))
    }
}

impl From<serde_json::Error> for SubpulseError {
    fn from(err: serde_json::Error) -> Self {
        SubpulseError::Io(format!("JSON serialization error: {}", err))
    }
}

impl From<candle_core::Error> for SubpulseError {
    fn from(err: candle_core::Error) -> Self {
        SubpulseError::Inference(err.to_string())
    }
}
