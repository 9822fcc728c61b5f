//! Output formatting infrastructure for CLI commands.

use async_trait::async_trait;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::models::{AggregateReport, Sentiment};
use crate::services::ProgressReporter;

/// Shown for both upstream failures and empty successful fetches.
pub const NO_DATA_MESSAGE: &str = "No data found or subreddit is private/restricted.";

/// Output mode for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    Markdown,
}

impl OutputMode {
    pub fn from_flags(json: bool, md: bool) -> Self {
        if json {
            OutputMode::Json
        } else if md {
            OutputMode::Markdown
        } else {
            OutputMode::Human
        }
    }
}

/// Print a single item as pretty-printed JSON.
pub fn output_json<T: Serialize>(item: &T) {
    match serde_json::to_string_pretty(item) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to serialize to JSON: {}", e)),
    }
}

/// Print a formatted table with headers and rows.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        println!("{}", "No results found.".dimmed());
        return;
    }
    println!("{}", render_table(headers, rows));
}

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers);
    for row in rows {
        table.add_row(row);
    }
    table
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", "OK".green().bold(), msg);
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

/// Print a warning message to stderr.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), msg);
}

/// Print a bold section header.
pub fn print_header(title: &str) {
    println!("\n{}\n", title.bold());
}

/// Print a key-value pair line.
pub fn print_kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a dimmed hint/suggestion message.
pub fn print_hint(msg: &str) {
    println!("{}", msg.dimmed());
}

/// Horizontal bar, one block per two percent.
pub fn percent_bar(percentage: f64) -> String {
    "█".repeat((percentage / 2.0).round().max(0.0) as usize)
}

/// Shorten text to `max` characters on a char boundary, single line.
pub fn truncate(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Colorize a label for terminal output.
pub fn colored_label(label: Sentiment) -> String {
    let text = format!("{} {}", label.emoji(), label.title());
    match label {
        Sentiment::Positive => text.green().to_string(),
        Sentiment::Neutral => text.yellow().to_string(),
        Sentiment::Negative => text.red().to_string(),
    }
}

/// Distribution rows in presentation order (positive, neutral, negative).
pub fn distribution_rows(report: &AggregateReport) -> Vec<Vec<String>> {
    Sentiment::PRIORITY
        .iter()
        .map(|&label| {
            vec![
                colored_label(label),
                report.count(label).to_string(),
                format!("{:.1}%", report.percentage(label)),
                percent_bar(report.percentage(label)),
            ]
        })
        .collect()
}

/// Markdown table of the distribution.
pub fn distribution_markdown(report: &AggregateReport) -> String {
    let mut out = String::from("| Sentiment | Count | Share |\n|---|---:|---:|\n");
    for label in Sentiment::PRIORITY {
        out.push_str(&format!(
            "| {} {} | {} | {:.1}% |\n",
            label.emoji(),
            label.title(),
            report.count(label),
            report.percentage(label)
        ));
    }
    out
}

/// Terminal progress bar driven through [`ProgressReporter`].
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(steps: u64) -> Self {
        let bar = ProgressBar::new(steps);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    pub fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }
}

#[async_trait]
impl ProgressReporter for BarProgress {
    async fn report(&self, current: f64, total: f64, message: Option<String>) {
        let len = self.bar.length().unwrap_or(0) as f64;
        let fraction = if total > 0.0 { current / total } else { 0.0 };
        self.bar.set_position((fraction * len).round() as u64);
        if let Some(msg) = message {
            self.bar.set_message(msg);
        }
    }
}
