//! Forum data sources.
//!
//! [`ForumSource`] feeds the interactive analyzer with (post title, comment)
//! pairs from a community's hot listing. [`ForumArchive`] feeds the bulk
//! scraper with full post and comment records from the newest listing.

pub mod reddit;
pub mod scrape;

use async_trait::async_trait;

use crate::models::{Comment, CommentRecord, PostRecord};
use crate::SubpulseError;

pub use reddit::{RedditClient, RedditCredentials};
pub use scrape::{BulkScraper, ScrapeOptions, ScrapeSummary};

/// Source of comments for sentiment analysis.
#[async_trait]
pub trait ForumSource: Send + Sync {
    /// Fetch comments under the community's current hot posts.
    ///
    /// An empty vector is a valid answer (no posts, or no comments).
    async fn fetch(&self, community: &str) -> Result<Vec<Comment>, SubpulseError>;
}

/// Listing access used by the bulk scraper.
#[async_trait]
pub trait ForumArchive: Send + Sync {
    /// Newest posts of a community, at most `limit`.
    async fn list_new_posts(
        &self,
        community: &str,
        limit: usize,
    ) -> Result<Vec<PostRecord>, SubpulseError>;

    /// First `limit` comments of a post, breadth-first over the comment tree.
    async fn list_comments(
        &self,
        post: &PostRecord,
        limit: usize,
    ) -> Result<Vec<CommentRecord>, SubpulseError>;
}

/// Canonical community name: trimmed, `r/` prefix removed, lowercased.
///
/// Names must be 1-21 characters of ASCII letters, digits, or underscores.
pub fn normalize_community(name: &str) -> Result<String, SubpulseError> {
    let trimmed = name.trim();
    let stripped = trimmed
        .strip_prefix("/r/")
        .or_else(|| trimmed.strip_prefix("r/"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if stripped.is_empty() {
        return Err(SubpulseError::Validation(
            "Subreddit name must not be empty".to_string(),
        ));
    }
    if stripped.len() > 21 {
        return Err(SubpulseError::Validation(format!(
            "Subreddit name '{}' is longer than 21 characters",
            stripped
        )));
    }
    if !stripped
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SubpulseError::Validation(format!(
            "Subreddit name '{}' may only contain letters, digits, and underscores",
            stripped
        )));
    }
    Ok(stripped.to_lowercase())
}
