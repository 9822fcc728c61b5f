//! `subpulse analyze`: sentiment distribution for one post.

use anyhow::Result;
use colored::Colorize;

use crate::cli::handlers::{is_no_data, report_no_data};
use crate::cli::output::{
    colored_label, distribution_markdown, distribution_rows, output_json, print_header,
    print_kv, print_table, truncate, OutputMode,
};
use crate::init::AppContext;
use crate::services::Analysis;

const COMMENT_PREVIEW_CHARS: usize = 100;

pub async fn handle_analyze(
    ctx: &AppContext,
    subreddit: &str,
    post: Option<&str>,
    show_comments: bool,
    mode: OutputMode,
) -> Result<()> {
    let analysis = match ctx.analysis.analyze(subreddit, post).await {
        Ok(analysis) => analysis,
        Err(e) if is_no_data(&e) => {
            report_no_data(subreddit, Some(&e), mode);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match mode {
        OutputMode::Json => {
            if show_comments {
                output_json(&analysis);
            } else {
                output_json(&serde_json::json!({
                    "community": analysis.community,
                    "post_title": analysis.post_title,
                    "report": analysis.report,
                }));
            }
        }
        OutputMode::Markdown => print_markdown(&analysis, show_comments),
        OutputMode::Human => print_human(&analysis, show_comments),
    }
    Ok(())
}

fn print_human(analysis: &Analysis, show_comments: bool) {
    let report = &analysis.report;
    let dominant = report.dominant;

    print_header(&format!("📊 Analysis Results: r/{}", analysis.community));
    print_kv("Post", &analysis.post_title);
    print_kv("Comments", &report.total.to_string());
    println!();
    println!("  {} {}", "Overall Sentiment:".bold(), colored_label(dominant));
    println!(
        "  {}",
        format!(
            "{:.1}% of comments show {} sentiment",
            report.percentage(dominant),
            dominant
        )
        .dimmed()
    );
    println!();

    print_table(&["Sentiment", "Count", "Share", ""], distribution_rows(report));

    if show_comments {
        let rows = analysis
            .results
            .iter()
            .map(|r| {
                vec![
                    colored_label(r.label),
                    truncate(&r.comment.text, COMMENT_PREVIEW_CHARS),
                ]
            })
            .collect();
        print_table(&["Sentiment", "Comment"], rows);
    }
}

fn print_markdown(analysis: &Analysis, show_comments: bool) {
    let report = &analysis.report;
    let dominant = report.dominant;

    println!("## r/{}: {}\n", analysis.community, analysis.post_title);
    println!(
        "**Overall sentiment:** {} {} ({:.1}% of {} comments)\n",
        dominant.emoji(),
        dominant.title(),
        report.percentage(dominant),
        report.total
    );
    print!("{}", distribution_markdown(report));

    if show_comments {
        println!("\n### Comments\n");
        for result in &analysis.results {
            println!(
                "- **{}**: {}",
                result.label.title(),
                truncate(&result.comment.text, COMMENT_PREVIEW_CHARS)
            );
        }
    }
}
