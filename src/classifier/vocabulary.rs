//! Fixed word vocabulary and tokenizer.
//!
//! Reads the word index written by the training notebook's Keras tokenizer
//! and reproduces `texts_to_sequences`: lowercase, replace filter characters
//! with the split string, split, then look every word up. The out-of-vocabulary
//! policy comes from the artifact itself so inference always matches training.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::SubpulseError;

const VOCABULARY_ARTIFACT: &str = "vocabulary.json";

/// Keras' default `filters` argument.
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// What happens to words the vocabulary does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OovPolicy {
    /// Unknown words map to this reserved id.
    MapTo(u32),
    /// Unknown words are skipped.
    Drop,
}

/// On-disk layout of `vocabulary.json`.
#[derive(Debug, Deserialize)]
struct VocabularyFile {
    word_index: HashMap<String, u32>,
    #[serde(default)]
    oov_token: Option<String>,
    #[serde(default)]
    num_words: Option<u32>,
    #[serde(default = "default_true")]
    lower: bool,
    #[serde(default = "default_filters")]
    filters: String,
    #[serde(default = "default_split")]
    split: String,
}

fn default_true() -> bool {
    true
}

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_split() -> String {
    " ".to_string()
}

/// Immutable token -> id table.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    word_index: HashMap<String, u32>,
    oov_policy: OovPolicy,
    num_words: Option<u32>,
    lower: bool,
    filters: Vec<char>,
    split: String,
}

impl Vocabulary {
    /// Load `vocabulary.json` from disk.
    pub fn load(path: &Path) -> Result<Self, SubpulseError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SubpulseError::load(VOCABULARY_ARTIFACT, format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate the vocabulary artifact.
    pub fn from_json(contents: &str) -> Result<Self, SubpulseError> {
        let file: VocabularyFile = serde_json::from_str(contents)
            .map_err(|e| SubpulseError::load(VOCABULARY_ARTIFACT, e))?;

        let oov_policy = match &file.oov_token {
            Some(token) => {
                let id = file.word_index.get(token).copied().ok_or_else(|| {
                    SubpulseError::load(
                        VOCABULARY_ARTIFACT,
                        format!("oov_token '{}' is missing from word_index", token),
                    )
                })?;
                OovPolicy::MapTo(id)
            }
            None => OovPolicy::Drop,
        };

        Self::new(
            file.word_index,
            oov_policy,
            file.num_words,
            file.lower,
            &file.filters,
            file.split,
        )
    }

    /// Build a vocabulary from an in-memory word index.
    ///
    /// Ids must be unique and non-zero; id 0 is the padding id.
    pub fn new(
        word_index: HashMap<String, u32>,
        oov_policy: OovPolicy,
        num_words: Option<u32>,
        lower: bool,
        filters: &str,
        split: String,
    ) -> Result<Self, SubpulseError> {
        if split.is_empty() {
            return Err(SubpulseError::load(
                VOCABULARY_ARTIFACT,
                "split string must not be empty",
            ));
        }

        {
            let mut seen: HashMap<u32, &str> = HashMap::with_capacity(word_index.len());
            for (word, &id) in &word_index {
                if id == 0 {
                    return Err(SubpulseError::load(
                        VOCABULARY_ARTIFACT,
                        format!("word '{}' uses id 0, which is reserved for padding", word),
                    ));
                }
                if let Some(other) = seen.insert(id, word) {
                    return Err(SubpulseError::load(
                        VOCABULARY_ARTIFACT,
                        format!("id {} is assigned to both '{}' and '{}'", id, other, word),
                    ));
                }
            }
        }

        if let OovPolicy::MapTo(0) = oov_policy {
            return Err(SubpulseError::load(
                VOCABULARY_ARTIFACT,
                "the unknown-word id must not be the padding id 0",
            ));
        }

        Ok(Self {
            word_index,
            oov_policy,
            num_words,
            lower,
            filters: filters.chars().collect(),
            split,
        })
    }

    /// Split text into words the way the training tokenizer did.
    pub fn words(&self, text: &str) -> Vec<String> {
        let text = if self.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let mut cleaned = String::with_capacity(text.len());
        for c in text.chars() {
            if self.filters.contains(&c) {
                cleaned.push_str(&self.split);
            } else {
                cleaned.push(c);
            }
        }

        cleaned
            .split(self.split.as_str())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Map text to token ids. Never fails; empty text yields an empty sequence.
    pub fn tokenize(&self, text: &str) -> Vec<u32> {
        self.words(text)
            .iter()
            .filter_map(|word| self.lookup(word))
            .collect()
    }

    fn lookup(&self, word: &str) -> Option<u32> {
        let known = self
            .word_index
            .get(word)
            .copied()
            .filter(|&id| self.num_words.map_or(true, |limit| id < limit));

        match (known, self.oov_policy) {
            (Some(id), _) => Some(id),
            (None, OovPolicy::MapTo(oov)) => Some(oov),
            (None, OovPolicy::Drop) => None,
        }
    }

    pub fn oov_policy(&self) -> OovPolicy {
        self.oov_policy
    }

    /// Largest id this vocabulary can emit.
    pub fn max_id(&self) -> u32 {
        let max_word = self
            .word_index
            .values()
            .copied()
            .filter(|&id| self.num_words.map_or(true, |limit| id < limit))
            .max()
            .unwrap_or(0);
        match self.oov_policy {
            OovPolicy::MapTo(oov) => max_word.max(oov),
            OovPolicy::Drop => max_word,
        }
    }

    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }
}
