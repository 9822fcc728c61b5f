//! Application configuration.
//!
//! Loaded from a TOML file with priority:
//! 1. explicit `--config` path / `SUBPULSE_CONFIG` env var
//! 2. `./subpulse.toml`
//! 3. `{config_dir}/subpulse/subpulse.toml`
//! 4. built-in defaults
//!
//! `SUBPULSE_MODEL_DIR` and `SUBPULSE_MODEL_REPO` override the model
//! section. Reddit credentials are read from the environment only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::SubpulseError;

pub const CONFIG_FILE_NAME: &str = "subpulse.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub model: ModelConfig,
    pub cache: CacheSettings,
    pub scrape: ScrapeConfig,
}

/// Reddit API access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub user_agent: String,
    /// HTTP timeout per request (default: 30)
    pub timeout_secs: u64,
    /// Hot posts fetched per analysis (default: 10)
    pub hot_posts: usize,
    /// Top-level comments kept per post (default: 40)
    pub comments_per_post: usize,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("subpulse/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            hot_posts: 10,
            comments_per_post: 40,
        }
    }
}

impl RedditConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the sentiment model artifacts come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding vocabulary.json, labels.json, model_config.json, model.safetensors
    pub dir: Option<PathBuf>,
    /// HuggingFace Hub repo to download artifacts from when `dir` is unset
    pub hub_repo: Option<String>,
    /// Bound on one batch inference (default: 30)
    pub inference_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: None,
            hub_repo: None,
            inference_timeout_secs: 30,
        }
    }
}

impl ModelConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Local artifact directory: configured one, else `{data_dir}/subpulse/model`.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("subpulse").join("model"))
                .unwrap_or_else(|| PathBuf::from("model"))
        })
    }
}

/// Fetch cache owned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Time-to-live of a cached fetch (default: 300 = 5 minutes)
    pub ttl_secs: u64,
    /// Maximum number of cached communities (default: 64)
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_capacity: 64,
        }
    }
}

/// Bulk scraper defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub subreddits: Vec<String>,
    /// Newest posts per subreddit (default: 100)
    pub posts_per_subreddit: usize,
    /// Comments per post (default: 10)
    pub comments_per_post: usize,
    /// Pause between subreddits (default: 2)
    pub request_delay_secs: u64,
    /// Pause after a failed request (default: 5)
    pub retry_delay_secs: u64,
    pub out_dir: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            subreddits: [
                "imsorryjon",
                "desirepath",
                "Backrooms",
                "LiminalSpace",
                "BoneHurtingJuice",
                "DisneyVacation",
                "BootTooBig",
                "Slavs_Squatting",
                "BreadStapledToTrees",
                "BirdsArentReal",
                "BirdsWithArms",
                "SubSimulatorGPT2",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            posts_per_subreddit: 100,
            comments_per_post: 10,
            request_delay_secs: 2,
            retry_delay_secs: 5,
            out_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Load configuration following the lookup order, then apply env overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SubpulseError> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("SUBPULSE_CONFIG").ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match Self::discover() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SubpulseError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SubpulseError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents)
            .map_err(|e| SubpulseError::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, SubpulseError> {
        toml::from_str(contents).map_err(|e| SubpulseError::Config(e.to_string()))
    }

    /// First existing config file among the well-known locations.
    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|d| d.join("subpulse").join(CONFIG_FILE_NAME))
            .filter(|p| p.is_file())
    }

    /// Apply `SUBPULSE_MODEL_DIR` / `SUBPULSE_MODEL_REPO` via `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SUBPULSE_MODEL_DIR").filter(|v| !v.is_empty()) {
            self.model.dir = Some(PathBuf::from(dir));
        }
        if let Some(repo) = lookup("SUBPULSE_MODEL_REPO").filter(|v| !v.is_empty()) {
            self.model.hub_repo = Some(repo);
        }
    }
}
