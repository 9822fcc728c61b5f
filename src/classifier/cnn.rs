//! Candle-based convolutional text classifier.
//!
//! Pure-Rust inference for the sentiment CNN: token embedding, a single
//! 1-D convolution with ReLU, global max pooling over time, an optional
//! dense layer, and a softmax output layer. Architecture comes from
//! `model_config.json`, weights from `model.safetensors`.
//!
//! Tensor names follow candle's layout: `embedding.weight` `[vocab, dim]`,
//! `conv.weight` `[filters, dim, kernel]`, `conv.bias`, `hidden.weight`
//! `[hidden, filters]`, `hidden.bias`, `output.weight` `[labels, in]`,
//! `output.bias`. Kernels exported from Keras must be transposed to match.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{Conv1d, Conv1dConfig, Embedding, Linear, Module, VarBuilder};
use serde::{Deserialize, Serialize};

use crate::classifier::artifacts::ModelFiles;
use crate::classifier::sequence::{SequenceShape, Side, DEFAULT_MAX_LEN};
use crate::classifier::{Classifier, PaddedSequence};
use crate::SubpulseError;

const CONFIG_ARTIFACT: &str = "model_config.json";
const WEIGHTS_ARTIFACT: &str = "model.safetensors";

/// Architecture and input conventions of a trained CNN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CnnConfig {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub conv_filters: usize,
    pub kernel_size: usize,
    #[serde(default)]
    pub hidden_units: Option<usize>,
    pub num_labels: usize,
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    #[serde(default)]
    pub padding: Side,
    #[serde(default)]
    pub truncating: Side,
}

fn default_max_len() -> usize {
    DEFAULT_MAX_LEN
}

impl CnnConfig {
    pub fn load(path: &Path) -> Result<Self, SubpulseError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SubpulseError::load(CONFIG_ARTIFACT, format!("{}: {}", path.display(), e))
        })?;
        let config: CnnConfig = serde_json::from_str(&contents)
            .map_err(|e| SubpulseError::load(CONFIG_ARTIFACT, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SubpulseError> {
        let sizes = [
            ("vocab_size", self.vocab_size),
            ("embedding_dim", self.embedding_dim),
            ("conv_filters", self.conv_filters),
            ("kernel_size", self.kernel_size),
            ("num_labels", self.num_labels),
            ("max_len", self.max_len),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(SubpulseError::load(
                CONFIG_ARTIFACT,
                format!("{} must be greater than zero", name),
            ));
        }
        if self.hidden_units == Some(0) {
            return Err(SubpulseError::load(
                CONFIG_ARTIFACT,
                "hidden_units must be greater than zero when set",
            ));
        }
        if self.max_len < self.kernel_size {
            return Err(SubpulseError::load(
                CONFIG_ARTIFACT,
                format!(
                    "max_len ({}) is shorter than kernel_size ({})",
                    self.max_len, self.kernel_size
                ),
            ));
        }
        Ok(())
    }

    /// Input shape the network was trained on.
    pub fn shape(&self) -> SequenceShape {
        SequenceShape {
            max_len: self.max_len,
            padding: self.padding,
            truncating: self.truncating,
        }
    }
}

/// Select the best available compute device.
///
/// Tries Metal (macOS) or CUDA if the corresponding feature is enabled.
/// Runs a tiny conv1d on the device and falls back to CPU if the GPU backend lacks
/// the kernel.
pub fn select_device() -> Device {
    #[cfg(target_os = "macos")]
    {
        if let Ok(device) = Device::new_metal(0) {
            if conv1d_supported(&device) {
                tracing::info!("Using Metal GPU for inference");
                return device;
            }
            tracing::warn!("Metal GPU available but conv1d not supported, falling back to CPU");
        }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            if conv1d_supported(&device) {
                tracing::info!("Using CUDA GPU for inference");
                return device;
            }
            tracing::warn!("CUDA GPU available but conv1d not supported, falling back to CPU");
        }
    }
    tracing::info!("Using CPU for inference");
    Device::Cpu
}

/// Whether a device can run the conv1d forward pass.
#[allow(dead_code)]
fn conv1d_supported(device: &Device) -> bool {
    (|| -> candle_core::Result<()> {
        let kernel = Tensor::ones((2, 4, 3), DType::F32, device)?;
        let conv = Conv1d::new(kernel, None, Conv1dConfig::default());
        let input = Tensor::randn(0f32, 1.0, (1, 4, 8), device)?;
        let _ = conv.forward(&input)?.relu()?.max(2)?;
        Ok(())
    })()
    .is_ok()
}

/// Convolutional sentiment classifier.
pub struct CnnClassifier {
    embedding: Embedding,
    conv: Conv1d,
    hidden: Option<Linear>,
    output: Linear,
    config: CnnConfig,
    device: Device,
}

impl CnnClassifier {
    /// Build the network from a variable builder.
    pub fn new(config: CnnConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        let device = vb.device().clone();
        let embedding =
            candle_nn::embedding(config.vocab_size, config.embedding_dim, vb.pp("embedding"))?;
        let conv = candle_nn::conv1d(
            config.embedding_dim,
            config.conv_filters,
            config.kernel_size,
            Conv1dConfig::default(),
            vb.pp("conv"),
        )?;
        let hidden = config
            .hidden_units
            .map(|units| candle_nn::linear(config.conv_filters, units, vb.pp("hidden")))
            .transpose()?;
        let output_in = config.hidden_units.unwrap_or(config.conv_filters);
        let output = candle_nn::linear(output_in, config.num_labels, vb.pp("output"))?;

        Ok(Self {
            embedding,
            conv,
            hidden,
            output,
            config,
            device,
        })
    }

    /// Load config and weights from disk.
    pub fn load(files: &ModelFiles, device: Device) -> Result<Self, SubpulseError> {
        let config = CnnConfig::load(&files.config_path)?;

        if !files.weights_path.exists() {
            return Err(SubpulseError::load(
                WEIGHTS_ARTIFACT,
                format!("{} does not exist", files.weights_path.display()),
            ));
        }

        // SAFETY: mmap'd safetensors file, safe as long as the file is not modified
        // while the model is in use.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&files.weights_path], DType::F32, &device)
                .map_err(|e| SubpulseError::load(WEIGHTS_ARTIFACT, e))?
        };

        Self::new(config, vb).map_err(|e| SubpulseError::load(WEIGHTS_ARTIFACT, e))
    }

    /// Forward pass: `[batch, len]` ids -> `[batch, labels]` probabilities.
    fn forward(&self, ids: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.embedding.forward(ids)?;
        // [batch, len, dim] -> [batch, dim, len] for the convolution
        let x = x.transpose(1, 2)?.contiguous()?;
        let x = self.conv.forward(&x)?.relu()?;
        // Global max pool over time
        let x = x.max(2)?;
        let x = match &self.hidden {
            Some(hidden) => hidden.forward(&x)?.relu()?,
            None => x,
        };
        let logits = self.output.forward(&x)?;
        candle_nn::ops::softmax(&logits, 1)
    }

    pub fn config(&self) -> &CnnConfig {
        &self.config
    }
}

impl Classifier for CnnClassifier {
    fn predict(&self, batch: &[PaddedSequence]) -> Result<Vec<Vec<f32>>, SubpulseError> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        let len = self.config.max_len;
        if let Some(bad) = batch.iter().find(|s| s.len() != len) {
            return Err(SubpulseError::Inference(format!(
                "expected sequences of length {}, got {}",
                len,
                bad.len()
            )));
        }

        let ids: Vec<u32> = batch
            .iter()
            .flat_map(|s| s.as_slice().iter().copied())
            .collect();
        let ids = Tensor::from_vec(ids, (batch.len(), len), &self.device)?;

        let probs = self.forward(&ids)?;
        Ok(probs.to_vec2::<f32>()?)
    }

    fn num_labels(&self) -> usize {
        self.config.num_labels
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::classifier::sequence::normalize;

    fn tiny_config() -> CnnConfig {
        CnnConfig {
            vocab_size: 10,
            embedding_dim: 4,
            conv_filters: 2,
            kernel_size: 3,
            hidden_units: None,
            num_labels: 3,
            max_len: 8,
            padding: Side::Pre,
            truncating: Side::Pre,
        }
    }

    /// Weights where every row's logits equal `output_bias`.
    fn biased_weights(config: &CnnConfig, output_bias: [f32; 3]) -> HashMap<String, Tensor> {
        let dev = Device::Cpu;
        let zeros = |shape: &[usize]| Tensor::zeros(shape, DType::F32, &dev).unwrap();
        HashMap::from([
            (
                "embedding.weight".to_string(),
                zeros(&[config.vocab_size, config.embedding_dim]),
            ),
            (
                "conv.weight".to_string(),
                zeros(&[config.conv_filters, config.embedding_dim, config.kernel_size]),
            ),
            ("conv.bias".to_string(), zeros(&[config.conv_filters])),
            (
                "output.weight".to_string(),
                zeros(&[config.num_labels, config.conv_filters]),
            ),
            (
                "output.bias".to_string(),
                Tensor::new(&output_bias, &dev).unwrap(),
            ),
        ])
    }

    fn batch(config: &CnnConfig, texts: &[&[u32]]) -> Vec<PaddedSequence> {
        texts
            .iter()
            .map(|ids| normalize(ids, &config.shape()))
            .collect()
    }

    #[test]
    fn test_zero_weights_give_uniform_probabilities() {
        let config = tiny_config();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = CnnClassifier::new(config.clone(), vb).unwrap();

        let out = model
            .predict(&batch(&config, &[&[1, 2, 3], &[], &[9, 9, 9, 9, 9, 9, 9, 9, 9]]))
            .unwrap();
        assert_eq!(out.len(), 3);
        for row in out {
            assert_eq!(row.len(), 3);
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
            assert!(row.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-6));
        }
    }

    #[test]
    fn test_output_bias_drives_prediction() {
        let config = tiny_config();
        let vb = VarBuilder::from_tensors(
            biased_weights(&config, [0.0, 0.0, 5.0]),
            DType::F32,
            &Device::Cpu,
        );
        let model = CnnClassifier::new(config.clone(), vb).unwrap();

        let out = model.predict(&batch(&config, &[&[4, 5]])).unwrap();
        assert!(out[0][2] > 0.9);
        let sum: f32 = out[0].iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hidden_layer_is_optional() {
        let config = CnnConfig {
            hidden_units: Some(5),
            ..tiny_config()
        };
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = CnnClassifier::new(config.clone(), vb).unwrap();
        let out = model.predict(&batch(&config, &[&[1]])).unwrap();
        assert_eq!(out[0].len(), 3);
    }

    #[test]
    fn test_empty_batch_skips_inference() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = CnnClassifier::new(tiny_config(), vb).unwrap();
        assert!(model.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_sequence_length_is_rejected() {
        let config = tiny_config();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = CnnClassifier::new(config.clone(), vb).unwrap();
        let wrong = normalize(&[1, 2], &SequenceShape { max_len: 4, ..config.shape() });
        let err = model.predict(&[wrong]).unwrap_err();
        assert!(matches!(err, SubpulseError::Inference(_)));
    }

    #[test]
    fn test_missing_tensor_fails_construction() {
        let config = tiny_config();
        let mut weights = biased_weights(&config, [0.0, 0.0, 0.0]);
        weights.remove("conv.weight");
        let vb = VarBuilder::from_tensors(weights, DType::F32, &Device::Cpu);
        assert!(CnnClassifier::new(config, vb).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(tiny_config().validate().is_ok());

        let short = CnnConfig {
            max_len: 2,
            ..tiny_config()
        };
        assert!(short.validate().unwrap_err().to_string().contains("kernel_size"));

        let zero = CnnConfig {
            conv_filters: 0,
            ..tiny_config()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_config_defaults_to_keras_conventions() {
        let config: CnnConfig = serde_json::from_str(
            r#"{"vocab_size": 5000, "embedding_dim": 100, "conv_filters": 128,
                "kernel_size": 5, "num_labels": 3}"#,
        )
        .unwrap();
        assert_eq!(config.shape(), SequenceShape::default());
        assert_eq!(config.hidden_units, None);
    }
}
