//! Class index -> sentiment label table.

use std::path::Path;

use serde::Deserialize;

use crate::models::Sentiment;
use crate::SubpulseError;

const LABELS_ARTIFACT: &str = "labels.json";

/// On-disk layout of `labels.json`: the fitted encoder's classes in index order.
#[derive(Debug, Deserialize)]
struct LabelsFile {
    classes: Vec<String>,
}

/// Decodes classifier output rows into [`Sentiment`] labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDecoder {
    labels: Vec<Sentiment>,
}

impl LabelDecoder {
    pub fn load(path: &Path) -> Result<Self, SubpulseError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SubpulseError::load(LABELS_ARTIFACT, format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, SubpulseError> {
        let file: LabelsFile =
            serde_json::from_str(contents).map_err(|e| SubpulseError::load(LABELS_ARTIFACT, e))?;
        Self::from_classes(&file.classes)
    }

    /// Build the table from encoder class names, e.g. `["Negative", "Neutral", "Positive"]`.
    ///
    /// Every name must parse to a distinct label and every label must appear.
    pub fn from_classes<S: AsRef<str>>(classes: &[S]) -> Result<Self, SubpulseError> {
        let mut labels = Vec::with_capacity(classes.len());
        for class in classes {
            let label: Sentiment = class
                .as_ref()
                .parse()
                .map_err(|e: String| SubpulseError::load(LABELS_ARTIFACT, e))?;
            if labels.contains(&label) {
                return Err(SubpulseError::load(
                    LABELS_ARTIFACT,
                    format!("label '{}' appears more than once", label),
                ));
            }
            labels.push(label);
        }

        if let Some(missing) = Sentiment::ALL.iter().find(|l| !labels.contains(l)) {
            return Err(SubpulseError::load(
                LABELS_ARTIFACT,
                format!("label '{}' is missing from classes", missing),
            ));
        }

        Ok(Self { labels })
    }

    /// Index of the highest probability; ties go to the lowest index and NaN never wins.
    pub fn argmax(probabilities: &[f32]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &p) in probabilities.iter().enumerate() {
            if p.is_nan() {
                continue;
            }
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((idx, p)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Map one probability row to its label, or `None` when the row has no
    /// usable score (empty, all NaN, or wider than the label table).
    pub fn decode(&self, probabilities: &[f32]) -> Option<Sentiment> {
        Self::argmax(probabilities).and_then(|i| self.labels.get(i).copied())
    }

    pub fn labels(&self) -> &[Sentiment] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelDecoder {
    /// Alphabetical order, which is what a fitted label encoder produces.
    fn default() -> Self {
        Self {
            labels: Sentiment::ALL.to_vec(),
        }
    }
}
