//! Shared fixtures: tiny on-disk model artifacts, a stub forum source, and a
//! keyword classifier for pipelines that must not depend on trained weights.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use subpulse::classifier::vocabulary::DEFAULT_FILTERS;
use subpulse::classifier::{
    Classifier, CnnConfig, LabelDecoder, OovPolicy, PaddedSequence, SequenceShape, Side,
    Vocabulary,
};
use subpulse::models::Comment;
use subpulse::services::SentimentPipeline;
use subpulse::source::ForumSource;
use subpulse::SubpulseError;

/// Word index used by the tiny on-disk model.
pub const TINY_WORDS: [(&str, u32); 6] = [
    ("<OOV>", 1),
    ("good", 2),
    ("great", 3),
    ("bad", 4),
    ("awful", 5),
    ("thread", 6),
];

pub fn tiny_config(num_labels: usize) -> CnnConfig {
    CnnConfig {
        vocab_size: 8,
        embedding_dim: 4,
        conv_filters: 3,
        kernel_size: 2,
        hidden_units: None,
        num_labels,
        max_len: 12,
        padding: Side::Pre,
        truncating: Side::Pre,
    }
}

/// Write a complete set of artifacts with random weights into `dir`.
pub fn write_model(dir: &Path, config: &CnnConfig, words: &[(&str, u32)]) {
    let word_index: HashMap<&str, u32> = words.iter().copied().collect();
    let vocabulary = serde_json::json!({ "word_index": word_index, "oov_token": "<OOV>" });
    std::fs::write(dir.join("vocabulary.json"), vocabulary.to_string()).unwrap();

    let labels = serde_json::json!({ "classes": ["Negative", "Neutral", "Positive"] });
    std::fs::write(dir.join("labels.json"), labels.to_string()).unwrap();

    std::fs::write(
        dir.join("model_config.json"),
        serde_json::to_string_pretty(config).unwrap(),
    )
    .unwrap();

    let dev = Device::Cpu;
    let randn = |shape: (usize, usize)| Tensor::randn(0f32, 1f32, shape, &dev).unwrap();
    let weights: HashMap<String, Tensor> = HashMap::from([
        (
            "embedding.weight".to_string(),
            randn((config.vocab_size, config.embedding_dim)),
        ),
        (
            "conv.weight".to_string(),
            Tensor::randn(
                0f32,
                1f32,
                (config.conv_filters, config.embedding_dim, config.kernel_size),
                &dev,
            )
            .unwrap(),
        ),
        (
            "conv.bias".to_string(),
            Tensor::zeros(config.conv_filters, DType::F32, &dev).unwrap(),
        ),
        (
            "output.weight".to_string(),
            randn((config.num_labels, config.conv_filters)),
        ),
        (
            "output.bias".to_string(),
            Tensor::zeros(config.num_labels, DType::F32, &dev).unwrap(),
        ),
    ]);
    candle_core::safetensors::save(&weights, dir.join("model.safetensors")).unwrap();
}

/// Positive if a row contains id 1, negative if id 2, neutral otherwise.
pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn predict(&self, batch: &[PaddedSequence]) -> Result<Vec<Vec<f32>>, SubpulseError> {
        Ok(batch
            .iter()
            .map(|seq| {
                if seq.as_slice().contains(&1) {
                    vec![0.1, 0.1, 0.8]
                } else if seq.as_slice().contains(&2) {
                    vec![0.8, 0.1, 0.1]
                } else {
                    vec![0.1, 0.8, 0.1]
                }
            })
            .collect())
    }

    fn num_labels(&self) -> usize {
        3
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Pipeline where "good" reads positive, "bad" negative, anything else neutral.
pub fn keyword_pipeline() -> SentimentPipeline {
    let vocabulary = Vocabulary::new(
        HashMap::from([("good".to_string(), 1), ("bad".to_string(), 2)]),
        OovPolicy::Drop,
        None,
        true,
        DEFAULT_FILTERS,
        " ".to_string(),
    )
    .unwrap();
    let shape = SequenceShape {
        max_len: 8,
        padding: Side::Pre,
        truncating: Side::Pre,
    };
    let decoder = LabelDecoder::from_classes(&["negative", "neutral", "positive"]).unwrap();
    SentimentPipeline::new(vocabulary, shape, Arc::new(KeywordClassifier), decoder).unwrap()
}

/// In-memory forum that counts fetches and can be switched to failing.
pub struct StubSource {
    communities: HashMap<String, Vec<Comment>>,
    failing: AtomicBool,
    fetches: AtomicUsize,
    delay: Duration,
}

impl StubSource {
    pub fn new() -> Self {
        Self {
            communities: HashMap::new(),
            failing: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Make every fetch take this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_community(mut self, name: &str, comments: Vec<Comment>) -> Self {
        self.communities.insert(name.to_string(), comments);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForumSource for StubSource {
    async fn fetch(&self, community: &str) -> Result<Vec<Comment>, SubpulseError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SubpulseError::upstream(community, "HTTP 503 Service Unavailable"));
        }
        match self.communities.get(community) {
            Some(comments) => Ok(comments.clone()),
            None => Err(SubpulseError::upstream(community, "HTTP 404 Not Found")),
        }
    }
}

/// Two posts: three comments on the first, two on the second.
pub fn sample_comments() -> Vec<Comment> {
    vec![
        Comment::new("Weekly Discussion Thread", "good stuff everyone"),
        Comment::new("Weekly Discussion Thread", "this is bad"),
        Comment::new("Weekly Discussion Thread", "good good"),
        Comment::new("Found this in my backyard", "what is it"),
        Comment::new("Found this in my backyard", "bad news"),
    ]
}
