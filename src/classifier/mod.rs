//! Text classification infrastructure.
//!
//! The [`Classifier`] trait abstracts batch inference over padded token
//! sequences so the pipeline can run against the candle CNN backend in
//! production and against stubs in tests. Vocabulary, sequence shape, and
//! label table live next to it because they must match the weights.

pub mod artifacts;
pub mod cnn;
pub mod labels;
pub mod sequence;
pub mod vocabulary;

use crate::SubpulseError;

pub use artifacts::{download_artifacts, ModelArtifacts, ModelFiles};
pub use cnn::{select_device, CnnClassifier, CnnConfig};
pub use labels::LabelDecoder;
pub use sequence::{normalize, PaddedSequence, SequenceShape, Side, DEFAULT_MAX_LEN, PAD_ID};
pub use vocabulary::{OovPolicy, Vocabulary};

/// Batch classifier over fixed-length token sequences.
pub trait Classifier: Send + Sync {
    /// Return one probability vector per input row, each of length
    /// [`Classifier::num_labels`] and summing to 1.
    fn predict(&self, batch: &[PaddedSequence]) -> Result<Vec<Vec<f32>>, SubpulseError>;

    /// Size of each output vector.
    fn num_labels(&self) -> usize;

    /// Whether weights are loaded. Callers check this before every batch.
    fn is_available(&self) -> bool;
}

/// Classifier stand-in for contexts where no model is loaded.
///
/// Always reports as unavailable and refuses to predict.
pub struct NoopClassifier;

impl Default for NoopClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for NoopClassifier {
    fn predict(&self, _batch: &[PaddedSequence]) -> Result<Vec<Vec<f32>>, SubpulseError> {
        Err(SubpulseError::ModelUnavailable)
    }

    fn num_labels(&self) -> usize {
        3
    }

    fn is_available(&self) -> bool {
        false
    }
}
