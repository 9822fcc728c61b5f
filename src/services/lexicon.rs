//! Word-score lexicon labeling (AFINN format).
//!
//! Offline batch companion to the CNN pipeline: each comment's words are
//! stripped to ASCII letters, lowercased, and summed against the lexicon.
//! A positive sum is positive, a negative sum negative, zero neutral.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{LabeledComment, Sentiment};
use crate::SubpulseError;

const LEXICON_ARTIFACT: &str = "lexicon";

/// Word -> integer valence table.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer {
    scores: HashMap<String, i32>,
}

/// Input row of the labeler. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct CommentRow {
    comment_id: String,
    #[serde(alias = "comment_text", alias = "text")]
    body: String,
}

impl LexiconScorer {
    pub fn load(path: &Path) -> Result<Self, SubpulseError> {
        let file = std::fs::File::open(path).map_err(|e| {
            SubpulseError::load(LEXICON_ARTIFACT, format!("{}: {}", path.display(), e))
        })?;
        let scorer = Self::from_reader(BufReader::new(file))?;
        info!("Loaded {} lexicon entries from {}", scorer.len(), path.display());
        Ok(scorer)
    }

    /// Parse `word<TAB>score` lines. Lines without exactly one tab are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SubpulseError> {
        let mut scores = HashMap::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| SubpulseError::load(LEXICON_ARTIFACT, e))?;
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() != 2 {
                continue;
            }
            let score: i32 = parts[1].trim().parse().map_err(|_| {
                SubpulseError::load(
                    LEXICON_ARTIFACT,
                    format!("line {}: '{}' is not an integer score", idx + 1, parts[1]),
                )
            })?;
            scores.insert(parts[0].to_lowercase(), score);
        }
        Ok(Self { scores })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, i32)>) -> Self {
        Self {
            scores: pairs
                .into_iter()
                .map(|(w, s)| (w.to_lowercase(), s))
                .collect(),
        }
    }

    /// Sum of word scores; unknown words count 0.
    pub fn score(&self, text: &str) -> i32 {
        text.split_whitespace()
            .map(|word| {
                let cleaned: String = word
                    .chars()
                    .filter(char::is_ascii_alphabetic)
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                self.scores.get(&cleaned).copied().unwrap_or(0)
            })
            .sum()
    }

    pub fn label(&self, text: &str) -> Sentiment {
        match self.score(text) {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    /// Label every row of a comments CSV (`comment_id` and `body` columns).
    pub fn label_csv<R: std::io::Read>(
        &self,
        input: R,
    ) -> Result<Vec<LabeledComment>, SubpulseError> {
        let mut reader = csv::Reader::from_reader(input);
        let mut labeled = Vec::new();
        for row in reader.deserialize() {
            let row: CommentRow = row?;
            labeled.push(LabeledComment {
                sentiment: self.label(&row.body),
                comment_id: row.comment_id.trim().to_string(),
            });
        }
        debug!("Labeled {} comments", labeled.len());
        Ok(labeled)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Write `comment_id,sentiment` rows with a header.
pub fn write_labels<W: std::io::Write>(
    rows: &[LabeledComment],
    output: W,
) -> Result<(), SubpulseError> {
    let mut writer = csv::Writer::from_writer(output);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
