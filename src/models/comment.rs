//! Forum comments and bulk-scrape records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::sentiment::Sentiment;

/// A comment as consumed by the sentiment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Comment {
    /// Title of the post the comment belongs to
    pub post_title: String,
    /// Comment body
    pub text: String,
}

impl Comment {
    pub fn new(post_title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            post_title: post_title.into(),
            text: text.into(),
        }
    }
}

/// A post title with the number of fetched comments under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostSummary {
    pub title: String,
    pub comment_count: usize,
}

/// Group comments by post title, keeping first-seen order.
pub fn summarize_posts(comments: &[Comment]) -> Vec<PostSummary> {
    let mut posts: Vec<PostSummary> = Vec::new();
    for comment in comments {
        match posts.iter_mut().find(|p| p.title == comment.post_title) {
            Some(post) => post.comment_count += 1,
            None => posts.push(PostSummary {
                title: comment.post_title.clone(),
                comment_count: 1,
            }),
        }
    }
    posts
}

/// One row of the bulk-scrape posts file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: String,
    pub title: String,
    pub body: String,
    pub subreddit: String,
    pub flair: Option<String>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub total_score: i64,
    pub timestamp: DateTime<Utc>,
    pub awards: i64,
    pub num_comments: i64,
    /// Link URL for link posts, "text" for self posts without one
    pub media_type: String,
}

/// One row of the bulk-scrape comments file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub post_id: String,
    pub comment_id: String,
    /// Author name, or "deleted" when the account is gone
    pub author: String,
    pub body: String,
    pub upvotes: i64,
    pub timestamp: DateTime<Utc>,
}

/// Lexicon labeler output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledComment {
    pub comment_id: String,
    pub sentiment: Sentiment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_posts_keeps_first_seen_order() {
        let comments = vec![
            Comment::new("B post", "one"),
            Comment::new("A post", "two"),
            Comment::new("B post", "three"),
        ];
        let posts = summarize_posts(&comments);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "B post");
        assert_eq!(posts[0].comment_count, 2);
        assert_eq!(posts[1].title, "A post");
        assert_eq!(posts[1].comment_count, 1);
    }

    #[test]
    fn test_summarize_posts_empty() {
        assert!(summarize_posts(&[]).is_empty());
    }
}
