//! Presentation-side analysis service.
//!
//! Owns the fetch cache: comments for a community are fetched once and
//! served from a moka TTL cache until they expire. Failed fetches are never
//! cached. Analysis itself is always recomputed from the cached comments.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rapidfuzz::distance::levenshtein;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CacheSettings;
use crate::models::{summarize_posts, AggregateReport, Comment, PostSummary, SentimentResult};
use crate::services::pipeline::SentimentPipeline;
use crate::source::{normalize_community, ForumSource};
use crate::SubpulseError;

/// Minimum normalized Levenshtein similarity for a fuzzy title match.
pub const TITLE_MATCH_THRESHOLD: f64 = 0.6;

/// Fetch cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 64,
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.ttl_secs),
            max_capacity: settings.max_capacity,
        }
    }
}

/// Sentiment analysis of one post's comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Analysis {
    pub community: String,
    pub post_title: String,
    pub report: AggregateReport,
    pub results: Vec<SentimentResult>,
}

pub struct AnalysisService {
    source: Arc<dyn ForumSource>,
    pipeline: Arc<SentimentPipeline>,
    cache: Cache<String, Arc<Vec<Comment>>>,
}

impl AnalysisService {
    pub fn new(
        source: Arc<dyn ForumSource>,
        pipeline: Arc<SentimentPipeline>,
        config: CacheConfig,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();
        Self {
            source,
            pipeline,
            cache,
        }
    }

    /// Comments for a community, served from cache while fresh.
    ///
    /// Concurrent misses for the same community share one upstream fetch.
    pub async fn comments(&self, community: &str) -> Result<Arc<Vec<Comment>>, SubpulseError> {
        let key = normalize_community(community)?;

        self.cache
            .try_get_with(key.clone(), async {
                debug!("Cache miss for r/{}", key);
                let comments = self.source.fetch(&key).await?;
                info!("Fetched {} comments from r/{}", comments.len(), key);
                Ok::<_, SubpulseError>(Arc::new(comments))
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Distinct post titles with comment counts, in listing order.
    pub async fn posts(&self, community: &str) -> Result<Vec<PostSummary>, SubpulseError> {
        let comments = self.comments(community).await?;
        Ok(summarize_posts(&comments))
    }

    /// Classify and aggregate the comments of one post.
    ///
    /// With no `post_title` the first post is analyzed. A title that matches
    /// no post is a validation error; a community with no comments is
    /// [`SubpulseError::EmptyInput`].
    pub async fn analyze(
        &self,
        community: &str,
        post_title: Option<&str>,
    ) -> Result<Analysis, SubpulseError> {
        let key = normalize_community(community)?;
        let comments = self.comments(&key).await?;
        let posts = summarize_posts(&comments);

        let selected = match post_title {
            None => posts.first().ok_or(SubpulseError::EmptyInput)?,
            Some(query) => resolve_post_title(&posts, query).ok_or_else(|| {
                SubpulseError::Validation(format!("No post matching '{}' in r/{}", query, key))
            })?,
        };

        let batch: Vec<Comment> = comments
            .iter()
            .filter(|c| c.post_title == selected.title)
            .cloned()
            .collect();

        let (report, results) = self.pipeline.analyze(batch).await?;
        Ok(Analysis {
            community: key,
            post_title: selected.title.clone(),
            report,
            results,
        })
    }

    /// Drop the cached fetch for a community.
    pub async fn invalidate(&self, community: &str) -> Result<(), SubpulseError> {
        let key = normalize_community(community)?;
        self.cache.invalidate(&key).await;
        Ok(())
    }
}

/// Resolve a user-supplied title: exact, then case-insensitive, then the
/// best fuzzy match at or above [`TITLE_MATCH_THRESHOLD`].
pub fn resolve_post_title<'a>(posts: &'a [PostSummary], query: &str) -> Option<&'a PostSummary> {
    if let Some(post) = posts.iter().find(|p| p.title == query) {
        return Some(post);
    }

    let query_lower = query.trim().to_lowercase();
    if let Some(post) = posts.iter().find(|p| p.title.to_lowercase() == query_lower) {
        return Some(post);
    }

    posts
        .iter()
        .map(|p| {
            let similarity = levenshtein::normalized_similarity(
                query_lower.chars(),
                p.title.to_lowercase().chars(),
            );
            (p, similarity)
        })
        .filter(|(_, similarity)| *similarity >= TITLE_MATCH_THRESHOLD)
        // Earlier posts win ties
        .fold(None, |best: Option<(&PostSummary, f64)>, (p, s)| match best {
            Some((_, best_s)) if best_s >= s => best,
            _ => Some((p, s)),
        })
        .map(|(p, _)| p)
}
