//! Sentiment aggregation: counts, percentages, dominant label.

use std::collections::BTreeMap;

use crate::models::sentiment::dominant_label;
use crate::models::{AggregateReport, Sentiment, SentimentResult};
use crate::SubpulseError;

/// Aggregate per-comment results into a report.
pub fn aggregate(results: &[SentimentResult]) -> Result<AggregateReport, SubpulseError> {
    aggregate_labels(results.iter().map(|r| r.label))
}

/// Aggregate a stream of labels into a report.
///
/// Fails with [`SubpulseError::EmptyInput`] when there is nothing to count.
pub fn aggregate_labels<I>(labels: I) -> Result<AggregateReport, SubpulseError>
where
    I: IntoIterator<Item = Sentiment>,
{
    let mut counts: BTreeMap<Sentiment, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    // Every label is reported, even with zero comments.
    for label in Sentiment::ALL {
        counts.entry(label).or_insert(0);
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return Err(SubpulseError::EmptyInput);
    }

    let percentages = counts
        .iter()
        .map(|(&label, &count)| (label, round_one_decimal(100.0 * count as f64 / total as f64)))
        .collect();

    let dominant = dominant_label(&counts);

    Ok(AggregateReport {
        total,
        counts,
        percentages,
        dominant,
    })
}

/// Round half away from zero to one decimal place.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
