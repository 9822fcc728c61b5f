//! `subpulse scrape`: bulk offline scrape to CSV.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::output::{
    output_json, print_kv, print_success, print_warning, BarProgress, OutputMode,
};
use crate::config::AppConfig;
use crate::init::AppContext;
use crate::services::{noop_progress, ProgressReporter};
use crate::source::{BulkScraper, ScrapeOptions};

/// Command-line overrides of the `[scrape]` config section.
#[derive(Debug, Default)]
pub struct ScrapeArgs {
    pub subreddits: Vec<String>,
    pub limit: Option<usize>,
    pub comments_per_post: Option<usize>,
    pub out_dir: Option<PathBuf>,
}

impl ScrapeArgs {
    pub fn apply(self, mut options: ScrapeOptions) -> ScrapeOptions {
        if !self.subreddits.is_empty() {
            options.subreddits = self.subreddits;
        }
        if let Some(limit) = self.limit {
            options.posts_per_subreddit = limit;
        }
        if let Some(m) = self.comments_per_post {
            options.comments_per_post = m;
        }
        if let Some(dir) = self.out_dir {
            options.out_dir = dir;
        }
        options
    }
}

pub async fn handle_scrape(config: &AppConfig, args: ScrapeArgs, mode: OutputMode) -> Result<()> {
    let options = args.apply(ScrapeOptions::from(&config.scrape));
    let client = Arc::new(AppContext::reddit_client(config)?);

    let bar = (mode == OutputMode::Human)
        .then(|| Arc::new(BarProgress::new(options.subreddits.len() as u64)));
    let progress: Arc<dyn ProgressReporter> = match &bar {
        Some(bar) => bar.clone(),
        None => noop_progress(),
    };

    let summary = BulkScraper::new(client, progress).run(&options).await?;
    if let Some(bar) = &bar {
        bar.finish("done");
    }

    match mode {
        OutputMode::Json => output_json(&summary),
        OutputMode::Markdown => {
            println!("## Scrape summary\n");
            println!("- Posts: {}", summary.posts);
            println!("- Comments: {}", summary.comments);
            println!("- Posts file: `{}`", summary.posts_path.display());
            println!("- Comments file: `{}`", summary.comments_path.display());
            if !summary.failed_subreddits.is_empty() {
                println!("- Failed: {}", summary.failed_subreddits.join(", "));
            }
        }
        OutputMode::Human => {
            print_success(&format!(
                "Saved {} posts and {} comments",
                summary.posts, summary.comments
            ));
            print_kv("Posts", &summary.posts_path.display().to_string());
            print_kv("Comments", &summary.comments_path.display().to_string());
            if !summary.failed_subreddits.is_empty() {
                print_warning(&format!(
                    "Skipped subreddits: {}",
                    summary.failed_subreddits.join(", ")
                ));
            }
            if !summary.failed_posts.is_empty() {
                print_warning(&format!(
                    "Comments missing for {} posts",
                    summary.failed_posts.len()
                ));
            }
        }
    }
    Ok(())
}
