use rmcp::model::{Content, IntoContents};
use serde::Serialize;

use crate::cli::output::NO_DATA_MESSAGE;
use crate::SubpulseError;

/// Structured error response for MCP tool calls.
/// Provides error_code + suggestion so LLMs can auto-fix.
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub error_code: String,
    pub message: String,
    pub suggestion: String,
}

impl ToolError {
    fn new(code: &str, message: impl Into<String>, suggestion: &str) -> Self {
        Self {
            error_code: code.into(),
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

impl IntoContents for ToolError {
    fn into_contents(self) -> Vec<Content> {
        let json = serde_json::to_string(&self).unwrap_or_else(|_| self.message.clone());
        vec![Content::text(json)]
    }
}

impl From<SubpulseError> for ToolError {
    fn from(err: SubpulseError) -> Self {
        match err {
            // Upstream failures and empty listings look the same to the caller
            SubpulseError::UpstreamFetch { .. } | SubpulseError::EmptyInput => ToolError::new(
                "NO_DATA",
                NO_DATA_MESSAGE,
                "Check the subreddit name. Private, quarantined or empty subreddits return no data.",
            ),
            SubpulseError::Validation(msg) => ToolError::new(
                "INVALID_PARAMS",
                msg,
                "Use list_posts to see the available post titles.",
            ),
            SubpulseError::ModelUnavailable | SubpulseError::Load { .. } => ToolError::new(
                "MODEL_UNAVAILABLE",
                err.to_string(),
                "The sentiment model is not loaded. Check the model directory and restart the server.",
            ),
            SubpulseError::Timeout { .. } => ToolError::new(
                "TIMEOUT",
                err.to_string(),
                "Retry the operation; the subreddit listing is cached for a few minutes.",
            ),
            other => ToolError::new(
                "INTERNAL_ERROR",
                other.to_string(),
                "Retry the operation or simplify the request.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_and_empty_map_to_no_data() {
        let upstream = ToolError::from(SubpulseError::upstream("private", "HTTP 403"));
        let empty = ToolError::from(SubpulseError::EmptyInput);
        assert_eq!(upstream.error_code, "NO_DATA");
        assert_eq!(empty.error_code, "NO_DATA");
        assert_eq!(upstream.message, empty.message);
    }

    #[test]
    fn test_validation_classification() {
        let err = ToolError::from(SubpulseError::Validation("No post matching 'x'".into()));
        assert_eq!(err.error_code, "INVALID_PARAMS");
        assert!(err.suggestion.contains("list_posts"));
    }

    #[test]
    fn test_model_and_timeout_classification() {
        assert_eq!(
            ToolError::from(SubpulseError::ModelUnavailable).error_code,
            "MODEL_UNAVAILABLE"
        );
        let timeout = ToolError::from(SubpulseError::Timeout {
            operation: "Inference".into(),
            secs: 30,
        });
        assert_eq!(timeout.error_code, "TIMEOUT");
        assert_eq!(timeout.message, "Inference timed out after 30s");
    }

    #[test]
    fn test_internal_error_fallback() {
        let err = ToolError::from(SubpulseError::Io("disk full".into()));
        assert_eq!(err.error_code, "INTERNAL_ERROR");
        assert_eq!(err.into_contents().len(), 1);
    }
}
