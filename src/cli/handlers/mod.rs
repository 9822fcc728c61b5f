//! CLI command handlers.

pub mod analyze;
pub mod label;
pub mod posts;
pub mod scrape;

use serde_json::json;

use crate::cli::output::{output_json, print_warning, OutputMode, NO_DATA_MESSAGE};
use crate::SubpulseError;

/// Whether an error should be shown as "no data" rather than a failure.
pub(crate) fn is_no_data(err: &SubpulseError) -> bool {
    matches!(
        err,
        SubpulseError::UpstreamFetch { .. } | SubpulseError::EmptyInput
    )
}

/// Report an unavailable or empty community the same way in every mode.
pub(crate) fn report_no_data(community: &str, cause: Option<&SubpulseError>, mode: OutputMode) {
    if let Some(err) = cause {
        tracing::warn!("r/{}: {}", community, err);
    }
    match mode {
        OutputMode::Json => output_json(&json!({
            "subreddit": community,
            "error": "no_data",
            "message": NO_DATA_MESSAGE,
        })),
        OutputMode::Markdown => println!("> {}", NO_DATA_MESSAGE),
        OutputMode::Human => print_warning(NO_DATA_MESSAGE),
    }
}
