//! Sentiment labels, per-comment results, and the aggregate report.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::comment::Comment;

/// The fixed label set produced by the classifier.
///
/// Canonical string form is lowercase; parsing is case-insensitive so that
/// encoder tables written as "Positive" or "POSITIVE" map to the same label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    /// Every label, in lexicographic order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    /// Tie-break priority for the dominant label, highest first.
    /// Also the order the presentation layer lists labels in.
    pub const PRIORITY: [Sentiment; 3] =
        [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }

    /// Capitalized form for headings.
    pub fn title(&self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Negative => "😠",
            Sentiment::Neutral => "😐",
            Sentiment::Positive => "😊",
        }
    }

    fn priority_rank(&self) -> usize {
        match self {
            Sentiment::Positive => 0,
            Sentiment::Neutral => 1,
            Sentiment::Negative => 2,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            other => Err(format!(
                "Unknown sentiment label '{}'. Valid labels: negative, neutral, positive",
                other
            )),
        }
    }
}

/// Sentiment assigned to one comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SentimentResult {
    pub comment: Comment,
    pub label: Sentiment,
}

/// Aggregate over a batch of [`SentimentResult`]s.
///
/// `counts` and `percentages` always carry all three labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateReport {
    /// Number of comments aggregated
    pub total: usize,
    /// Comment count per label
    pub counts: BTreeMap<Sentiment, usize>,
    /// Share per label in percent, rounded to one decimal
    pub percentages: BTreeMap<Sentiment, f64>,
    /// Label with the highest count (ties: positive > neutral > negative)
    pub dominant: Sentiment,
}

impl AggregateReport {
    pub fn count(&self, label: Sentiment) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn percentage(&self, label: Sentiment) -> f64 {
        self.percentages.get(&label).copied().unwrap_or(0.0)
    }
}

/// Pick the label with the highest count, resolving ties by
/// [`Sentiment::PRIORITY`].
pub(crate) fn dominant_label(counts: &BTreeMap<Sentiment, usize>) -> Sentiment {
    Sentiment::PRIORITY
        .iter()
        .copied()
        .max_by(|a, b| {
            let ca = counts.get(a).copied().unwrap_or(0);
            let cb = counts.get(b).copied().unwrap_or(0);
            // Higher count wins; on equal counts the better-ranked label wins.
            ca.cmp(&cb)
                .then_with(|| b.priority_rank().cmp(&a.priority_rank()))
        })
        .unwrap_or(Sentiment::Neutral)
}
