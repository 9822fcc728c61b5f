//! Fixed-length sequence normalization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Id used to fill short sequences.
pub const PAD_ID: u32 = 0;

/// Sequence length the bundled classifier was trained with.
pub const DEFAULT_MAX_LEN: usize = 300;

/// Which end of a sequence padding or truncation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Start of the sequence (Keras default)
    #[default]
    Pre,
    /// End of the sequence
    Post,
}

/// Target shape for classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceShape {
    pub max_len: usize,
    #[serde(default)]
    pub padding: Side,
    #[serde(default)]
    pub truncating: Side,
}

impl Default for SequenceShape {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            padding: Side::Pre,
            truncating: Side::Pre,
        }
    }
}

/// A token sequence whose length equals the shape's `max_len`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaddedSequence(Vec<u32>);

impl PaddedSequence {
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u32> {
        self.0
    }
}

/// Truncate or pad `seq` to exactly `shape.max_len` ids.
pub fn normalize(seq: &[u32], shape: &SequenceShape) -> PaddedSequence {
    let len = shape.max_len;

    let kept: &[u32] = if seq.len() > len {
        match shape.truncating {
            Side::Pre => &seq[seq.len() - len..],
            Side::Post => &seq[..len],
        }
    } else {
        seq
    };

    let fill = len - kept.len();
    let mut out = Vec::with_capacity(len);
    match shape.padding {
        Side::Pre => {
            out.resize(fill, PAD_ID);
            out.extend_from_slice(kept);
        }
        Side::Post => {
            out.extend_from_slice(kept);
            out.resize(len, PAD_ID);
        }
    }

    PaddedSequence(out)
}
