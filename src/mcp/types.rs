use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{AggregateReport, PostSummary, SentimentResult};

/// Input for the list_posts tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListPostsInput {
    /// Subreddit name, with or without the r/ prefix
    pub subreddit: String,
    /// Drop the cached listing and fetch again (default: false)
    #[serde(default)]
    pub refresh: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListPostsResponse {
    pub community: String,
    /// Distinct post titles in listing order with their comment counts
    pub posts: Vec<PostSummary>,
}

/// Input for the analyze_post tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzePostInput {
    /// Subreddit name, with or without the r/ prefix
    pub subreddit: String,
    /// Post title to analyze. Exact, case-insensitive, or closest match.
    /// Defaults to the first post of the listing.
    #[serde(default)]
    pub post_title: Option<String>,
    /// Include every comment with its label (default: false)
    #[serde(default)]
    pub include_comments: Option<bool>,
    /// Drop the cached listing and fetch again (default: false)
    #[serde(default)]
    pub refresh: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzePostResponse {
    pub community: String,
    pub post_title: String,
    pub report: AggregateReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SentimentResult>>,
}
