//! Shared initialization logic for MCP and CLI modes.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::classifier::{download_artifacts, select_device, ModelArtifacts, ModelFiles};
use crate::config::{AppConfig, ModelConfig};
use crate::services::{AnalysisService, CacheConfig, SentimentPipeline};
use crate::source::{RedditClient, RedditCredentials};
use crate::SubpulseError;

/// Application context holding the loaded model and services.
///
/// Shared between MCP server and CLI commands.
pub struct AppContext {
    pub analysis: Arc<AnalysisService>,
}

impl AppContext {
    /// Load config, model artifacts, and credentials. Fails fast on any of them.
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(config_path)?;
        let reddit = Arc::new(Self::reddit_client(&config)?);

        let model_config = config.model.clone();
        let pipeline = tokio::task::spawn_blocking(move || load_pipeline(&model_config))
            .await
            .context("model loading task panicked")??;
        let analysis = Arc::new(AnalysisService::new(
            reddit,
            Arc::new(pipeline),
            CacheConfig::from(&config.cache),
        ));

        Ok(Self { analysis })
    }

    /// Reddit client from env credentials; used alone by the bulk scraper.
    pub fn reddit_client(config: &AppConfig) -> Result<RedditClient, SubpulseError> {
        let credentials = RedditCredentials::from_env()?;
        RedditClient::new(credentials, &config.reddit)
    }
}

/// Resolve artifact files: the local directory if complete, else the hub repo.
pub fn resolve_model_files(config: &ModelConfig) -> Result<ModelFiles, SubpulseError> {
    let dir = config.resolved_dir();
    let local = ModelFiles::in_dir(&dir);

    match (local.check_exists(), &config.hub_repo, &config.dir) {
        (Ok(()), _, _) => Ok(local),
        // An explicitly configured directory must be complete
        (Err(e), _, Some(_)) => Err(e),
        (Err(_), Some(repo), None) => {
            tracing::info!("Downloading model artifacts from {}", repo);
            download_artifacts(repo)
        }
        (Err(e), None, None) => Err(e),
    }
}

/// Load all artifacts and build the pipeline. Blocking.
pub fn load_pipeline(config: &ModelConfig) -> Result<SentimentPipeline, SubpulseError> {
    let files = resolve_model_files(config)?;
    tracing::info!("Loading sentiment model from {}", files.weights_path.display());
    let artifacts = ModelArtifacts::load(&files, select_device())?;
    Ok(SentimentPipeline::from_artifacts(artifacts)?
        .with_inference_timeout(config.inference_timeout()))
}
