//! `subpulse label`: lexicon labeling of a comments CSV.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{output_json, print_kv, print_success, OutputMode};
use crate::models::Sentiment;
use crate::services::{aggregate_labels, write_labels, LexiconScorer};

pub async fn handle_label(
    input: &Path,
    lexicon: &Path,
    output: Option<&Path>,
    mode: OutputMode,
) -> Result<()> {
    let scorer = LexiconScorer::load(lexicon)?;
    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let labeled = scorer.label_csv(file)?;

    match output {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_labels(&labeled, out)?;
        }
        // Rows go to stdout; nothing else may be printed there
        None => {
            write_labels(&labeled, std::io::stdout().lock())?;
            return Ok(());
        }
    }

    match mode {
        OutputMode::Json => output_json(&serde_json::json!({
            "labeled": labeled.len(),
            "report": aggregate_labels(labeled.iter().map(|l| l.sentiment)).ok(),
        })),
        _ => {
            print_success(&format!("Labeled {} comments", labeled.len()));
            if let Ok(report) = aggregate_labels(labeled.iter().map(|l| l.sentiment)) {
                for label in Sentiment::PRIORITY {
                    print_kv(
                        label.title(),
                        &format!("{} ({:.1}%)", report.count(label), report.percentage(label)),
                    );
                }
            }
        }
    }
    Ok(())
}
