use crate::config::Settings;
use crate::domain::symbol::validate_symbol;
use crate::model::serving::ServingBackend;
use crate::model::{LoadedModel, ModelLoader, ModelMetadata};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Reads `{symbol}_metadata.json` from a directory and serves the model
/// named after the symbol.
#[derive(Debug, Clone)]
pub struct DirectoryModelLoader {
    model_dir: PathBuf,
    serving_base_url: String,
    http: reqwest::Client,
}

impl DirectoryModelLoader {
    pub fn new(model_dir: PathBuf, serving_base_url: String, http: reqwest::Client) -> Self {
        Self {
            model_dir,
            serving_base_url,
            http,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let model_dir = PathBuf::from(settings.require_model_dir()?);
        let serving_base_url = settings.require_model_serving_url()?.to_string();

        let timeout_secs = std::env::var("MODEL_SERVING_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build model serving http client")?;

        Ok(Self::new(model_dir, serving_base_url, http))
    }

    fn metadata_path(&self, symbol: &str) -> PathBuf {
        self.model_dir.join(format!("{symbol}_metadata.json"))
    }
}

#[async_trait::async_trait]
impl ModelLoader for DirectoryModelLoader {
    async fn load(&self, symbol: &str) -> anyhow::Result<LoadedModel> {
        validate_symbol(symbol)?;

        let path = self.metadata_path(symbol);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read model metadata {}", path.display()))?;
        let metadata = serde_json::from_str::<ModelMetadata>(&text)
            .with_context(|| format!("invalid model metadata JSON in {}", path.display()))?;
        metadata
            .validate()
            .with_context(|| format!("invalid model metadata for {symbol}"))?;

        let backend = ServingBackend::new(self.http.clone(), &self.serving_base_url, symbol);
        Ok(LoadedModel {
            metadata,
            backend: Arc::new(backend),
        })
    }
}
