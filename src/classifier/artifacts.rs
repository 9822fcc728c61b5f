//! Persisted model artifacts: location, download, and fail-fast loading.

use std::path::{Path, PathBuf};

use candle_core::Device;
use tracing::info;

use crate::classifier::cnn::CnnClassifier;
use crate::classifier::labels::LabelDecoder;
use crate::classifier::vocabulary::Vocabulary;
use crate::classifier::{Classifier, SequenceShape};
use crate::SubpulseError;

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const LABELS_FILE: &str = "labels.json";
pub const CONFIG_FILE: &str = "model_config.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Paths to the four artifacts a sentiment model ships as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub vocabulary_path: PathBuf,
    pub labels_path: PathBuf,
    pub config_path: PathBuf,
    pub weights_path: PathBuf,
}

impl ModelFiles {
    /// Standard file names inside one directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            vocabulary_path: dir.join(VOCABULARY_FILE),
            labels_path: dir.join(LABELS_FILE),
            config_path: dir.join(CONFIG_FILE),
            weights_path: dir.join(WEIGHTS_FILE),
        }
    }

    /// Report the first missing artifact, if any.
    pub fn check_exists(&self) -> Result<(), SubpulseError> {
        let all = [
            (VOCABULARY_FILE, &self.vocabulary_path),
            (LABELS_FILE, &self.labels_path),
            (CONFIG_FILE, &self.config_path),
            (WEIGHTS_FILE, &self.weights_path),
        ];
        for (artifact, path) in all {
            if !path.is_file() {
                return Err(SubpulseError::load(
                    artifact,
                    format!("{} does not exist", path.display()),
                ));
            }
        }
        Ok(())
    }
}

/// Download model artifacts from HuggingFace Hub.
///
/// Uses `hf_hub::api::sync::Api` which caches at `~/.cache/huggingface/hub/`.
/// Performs synchronous I/O; call from `spawn_blocking` inside async code.
pub fn download_artifacts(repo_id: &str) -> Result<ModelFiles, SubpulseError> {
    let api = hf_hub::api::sync::Api::new()
        .map_err(|e| SubpulseError::load(repo_id, format!("HuggingFace Hub API: {}", e)))?;
    let repo = api.model(repo_id.to_string());

    let fetch = |name: &str| {
        repo.get(name)
            .map_err(|e| SubpulseError::load(name, format!("download from {}: {}", repo_id, e)))
    };

    Ok(ModelFiles {
        vocabulary_path: fetch(VOCABULARY_FILE)?,
        labels_path: fetch(LABELS_FILE)?,
        config_path: fetch(CONFIG_FILE)?,
        weights_path: fetch(WEIGHTS_FILE)?,
    })
}

/// Everything the pipeline needs, loaded together and checked against each other.
pub struct ModelArtifacts {
    pub vocabulary: Vocabulary,
    pub decoder: LabelDecoder,
    pub shape: SequenceShape,
    pub classifier: CnnClassifier,
}

impl ModelArtifacts {
    /// Load all artifacts or fail with the first problem found.
    ///
    /// Never returns partially loaded state: vocabulary ids must fit the
    /// embedding table and the label table must match the output layer.
    pub fn load(files: &ModelFiles, device: Device) -> Result<Self, SubpulseError> {
        files.check_exists()?;

        let vocabulary = Vocabulary::load(&files.vocabulary_path)?;
        let decoder = LabelDecoder::load(&files.labels_path)?;
        let classifier = CnnClassifier::load(files, device)?;
        let config = classifier.config();

        if vocabulary.max_id() as usize >= config.vocab_size {
            return Err(SubpulseError::load(
                VOCABULARY_FILE,
                format!(
                    "token id {} does not fit the model's vocab_size {}",
                    vocabulary.max_id(),
                    config.vocab_size
                ),
            ));
        }

        if decoder.len() != classifier.num_labels() {
            return Err(SubpulseError::load(
                LABELS_FILE,
                format!(
                    "{} classes but the model outputs {} labels",
                    decoder.len(),
                    classifier.num_labels()
                ),
            ));
        }

        let shape = config.shape();
        info!(
            "Sentiment model loaded ({} words, {} labels, max_len {}, {:?} padding)",
            vocabulary.len(),
            decoder.len(),
            shape.max_len,
            shape.padding
        );

        Ok(Self {
            vocabulary,
            decoder,
            shape,
            classifier,
        })
    }
}
