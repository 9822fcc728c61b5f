//! `subpulse posts`: list hot posts with fetched comment counts.

use anyhow::Result;

use crate::cli::handlers::{is_no_data, report_no_data};
use crate::cli::output::{output_json, print_header, print_hint, print_table, OutputMode};
use crate::init::AppContext;

pub async fn handle_posts(ctx: &AppContext, subreddit: &str, mode: OutputMode) -> Result<()> {
    let posts = match ctx.analysis.posts(subreddit).await {
        Ok(posts) => posts,
        Err(e) if is_no_data(&e) => {
            report_no_data(subreddit, Some(&e), mode);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if posts.is_empty() {
        report_no_data(subreddit, None, mode);
        return Ok(());
    }

    match mode {
        OutputMode::Json => output_json(&posts),
        OutputMode::Markdown => {
            println!("## Posts in r/{}\n", subreddit);
            for (i, post) in posts.iter().enumerate() {
                println!("{}. {} ({} comments)", i + 1, post.title, post.comment_count);
            }
        }
        OutputMode::Human => {
            print_header(&format!("Posts in r/{}", subreddit));
            let rows = posts
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    vec![
                        (i + 1).to_string(),
                        p.title.clone(),
                        p.comment_count.to_string(),
                    ]
                })
                .collect();
            print_table(&["#", "Post", "Comments"], rows);
            print_hint(&format!(
                "Analyze one with: subpulse analyze {} --post \"<title>\"",
                subreddit
            ));
        }
    }
    Ok(())
}
