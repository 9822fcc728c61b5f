//! Bulk offline scraper: newest posts and their comments to CSV.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::models::{CommentRecord, PostRecord};
use crate::services::progress::ProgressReporter;
use crate::source::ForumArchive;
use crate::SubpulseError;

pub const POSTS_FILE: &str = "reddit_posts.csv";
pub const COMMENTS_FILE: &str = "reddit_comments.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOptions {
    pub subreddits: Vec<String>,
    pub posts_per_subreddit: usize,
    pub comments_per_post: usize,
    /// Pause after each subreddit
    pub request_delay: Duration,
    /// Pause after a failed request before moving on
    pub retry_delay: Duration,
    pub out_dir: PathBuf,
}

impl From<&ScrapeConfig> for ScrapeOptions {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            subreddits: config.subreddits.clone(),
            posts_per_subreddit: config.posts_per_subreddit,
            comments_per_post: config.comments_per_post,
            request_delay: Duration::from_secs(config.request_delay_secs),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            out_dir: config.out_dir.clone(),
        }
    }
}

/// What a scrape run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeSummary {
    pub posts: usize,
    pub comments: usize,
    /// Subreddits whose listing could not be fetched
    pub failed_subreddits: Vec<String>,
    /// Posts whose comments could not be fetched
    pub failed_posts: Vec<String>,
    pub posts_path: PathBuf,
    pub comments_path: PathBuf,
}

pub struct BulkScraper {
    archive: Arc<dyn ForumArchive>,
    progress: Arc<dyn ProgressReporter>,
}

impl BulkScraper {
    pub fn new(archive: Arc<dyn ForumArchive>, progress: Arc<dyn ProgressReporter>) -> Self {
        Self { archive, progress }
    }

    /// Scrape every subreddit sequentially, then write both CSV files.
    ///
    /// Failures are logged and skipped; only file output errors abort the run.
    pub async fn run(&self, options: &ScrapeOptions) -> Result<ScrapeSummary, SubpulseError> {
        let mut posts: Vec<PostRecord> = Vec::new();
        let mut comments: Vec<CommentRecord> = Vec::new();
        let mut failed_subreddits = Vec::new();
        let mut failed_posts = Vec::new();
        let total = options.subreddits.len();

        for (idx, subreddit) in options.subreddits.iter().enumerate() {
            self.progress
                .step(idx, total, &format!("Scraping r/{}", subreddit))
                .await;
            info!("Scraping subreddit: {}", subreddit);

            let listing = match self
                .archive
                .list_new_posts(subreddit, options.posts_per_subreddit)
                .await
            {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Failed to fetch subreddit {}: {}", subreddit, e);
                    failed_subreddits.push(subreddit.clone());
                    tokio::time::sleep(options.retry_delay).await;
                    continue;
                }
            };

            for post in listing {
                match self
                    .archive
                    .list_comments(&post, options.comments_per_post)
                    .await
                {
                    Ok(mut batch) => {
                        batch.truncate(options.comments_per_post);
                        comments.extend(batch);
                    }
                    Err(e) => {
                        warn!("Error fetching comments for post {}: {}", post.post_id, e);
                        failed_posts.push(post.post_id.clone());
                        tokio::time::sleep(options.retry_delay).await;
                    }
                }
                posts.push(post);
            }

            tokio::time::sleep(options.request_delay).await;
        }
        self.progress.step(total, total, "Writing CSV files").await;

        std::fs::create_dir_all(&options.out_dir)?;
        let posts_path = options.out_dir.join(POSTS_FILE);
        let comments_path = options.out_dir.join(COMMENTS_FILE);
        write_csv(&posts_path, &posts)?;
        write_csv(&comments_path, &comments)?;
        info!(
            "Saved {} posts and {} comments to {}",
            posts.len(),
            comments.len(),
            options.out_dir.display()
        );

        Ok(ScrapeSummary {
            posts: posts.len(),
            comments: comments.len(),
            failed_subreddits,
            failed_posts,
            posts_path,
            comments_path,
        })
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SubpulseError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
