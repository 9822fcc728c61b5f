//! Sentiment-scoring pipeline: tokenize, normalize, classify, decode.
//!
//! The pipeline is built once from loaded artifacts and shared read-only
//! behind an `Arc`. Each call runs a single batch inference on tokio's
//! blocking pool, bounded by the configured timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::classifier::{
    normalize, Classifier, LabelDecoder, ModelArtifacts, PaddedSequence, SequenceShape,
    Vocabulary,
};
use crate::models::{AggregateReport, Comment, SentimentResult};
use crate::services::aggregate::aggregate;
use crate::SubpulseError;

/// Default bound on one batch inference.
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Allowed drift of a probability row's sum from 1.
const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

pub struct SentimentPipeline {
    vocabulary: Arc<Vocabulary>,
    shape: SequenceShape,
    classifier: Arc<dyn Classifier>,
    decoder: LabelDecoder,
    inference_timeout: Duration,
}

impl SentimentPipeline {
    /// Assemble a pipeline from parts. The label table must match the
    /// classifier's output width.
    pub fn new(
        vocabulary: Vocabulary,
        shape: SequenceShape,
        classifier: Arc<dyn Classifier>,
        decoder: LabelDecoder,
    ) -> Result<Self, SubpulseError> {
        if decoder.len() != classifier.num_labels() {
            return Err(SubpulseError::load(
                "labels.json",
                format!(
                    "{} classes but the classifier outputs {} labels",
                    decoder.len(),
                    classifier.num_labels()
                ),
            ));
        }
        Ok(Self {
            vocabulary: Arc::new(vocabulary),
            shape,
            classifier,
            decoder,
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
        })
    }

    pub fn from_artifacts(artifacts: ModelArtifacts) -> Result<Self, SubpulseError> {
        let ModelArtifacts {
            vocabulary,
            decoder,
            shape,
            classifier,
        } = artifacts;
        Self::new(vocabulary, shape, Arc::new(classifier), decoder)
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn shape(&self) -> &SequenceShape {
        &self.shape
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_available()
    }

    /// Tokenize and normalize one text.
    pub fn prepare(&self, text: &str) -> PaddedSequence {
        normalize(&self.vocabulary.tokenize(text), &self.shape)
    }

    /// Label every comment with one batch inference.
    ///
    /// An empty input returns an empty result without touching the model.
    /// Any failure fails the whole batch; no partial results are returned.
    pub async fn classify(
        &self,
        comments: Vec<Comment>,
    ) -> Result<Vec<SentimentResult>, SubpulseError> {
        if comments.is_empty() {
            return Ok(vec![]);
        }
        if !self.classifier.is_available() {
            return Err(SubpulseError::ModelUnavailable);
        }

        let batch: Vec<PaddedSequence> = comments.iter().map(|c| self.prepare(&c.text)).collect();
        let expected_rows = batch.len();
        debug!("Classifying batch of {} comments", expected_rows);

        let classifier = self.classifier.clone();
        let task = tokio::task::spawn_blocking(move || classifier.predict(&batch));

        let probabilities = tokio::time::timeout(self.inference_timeout, task)
            .await
            .map_err(|_| {
                warn!(
                    "Inference exceeded {}s for {} comments",
                    self.inference_timeout.as_secs(),
                    expected_rows
                );
                SubpulseError::Timeout {
                    operation: "Sentiment inference".to_string(),
                    secs: self.inference_timeout.as_secs(),
                }
            })?
            .map_err(|e| SubpulseError::Inference(format!("Task join error: {}", e)))??;

        self.check_output(&probabilities, expected_rows)?;

        comments
            .into_iter()
            .zip(probabilities.iter())
            .map(|(comment, row)| {
                let label = self.decoder.decode(row).ok_or_else(|| {
                    SubpulseError::Inference(format!("no usable score in row {:?}", row))
                })?;
                Ok(SentimentResult { comment, label })
            })
            .collect()
    }

    /// Classify and aggregate in one step.
    pub async fn analyze(
        &self,
        comments: Vec<Comment>,
    ) -> Result<(AggregateReport, Vec<SentimentResult>), SubpulseError> {
        if comments.is_empty() {
            return Err(SubpulseError::EmptyInput);
        }
        let results = self.classify(comments).await?;
        let report = aggregate(&results)?;
        Ok((report, results))
    }

    fn check_output(&self, rows: &[Vec<f32>], expected_rows: usize) -> Result<(), SubpulseError> {
        if rows.len() != expected_rows {
            return Err(SubpulseError::Inference(format!(
                "classifier returned {} rows for {} inputs",
                rows.len(),
                expected_rows
            )));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != self.decoder.len()) {
            return Err(SubpulseError::Inference(format!(
                "classifier returned {} scores, expected {}",
                row.len(),
                self.decoder.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.iter().any(|p| !p.is_finite()) {
                return Err(SubpulseError::Inference(format!(
                    "classifier returned non-finite scores for row {}",
                    i
                )));
            }
            let sum: f32 = row.iter().sum();
            if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
                return Err(SubpulseError::Inference(format!(
                    "classifier scores for row {} sum to {}, not 1",
                    i, sum
                )));
            }
        }
        Ok(())
    }
}
