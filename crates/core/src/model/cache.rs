use crate::model::LoadedModel;
use std::collections::HashMap;
use std::sync::Arc;

/// Produces a [`LoadedModel`] for a symbol.
#[async_trait::async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, symbol: &str) -> anyhow::Result<LoadedModel>;
}

/// Per-symbol model cache with explicit load and evict operations.
///
/// Shared by reference (typically inside an `Arc`); there is no process-wide
/// instance.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    entries: tokio::sync::Mutex<HashMap<String, Arc<LoadedModel>>>,
}

impl ModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            entries: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached model, loading it on first use.
    pub async fn get_or_load(&self, symbol: &str) -> anyhow::Result<Arc<LoadedModel>> {
        if let Some(model) = self.entries.lock().await.get(symbol) {
            return Ok(model.clone());
        }
        self.load(symbol).await
    }

    /// Loads (or reloads) the model for `symbol`, replacing any cached entry.
    /// On failure the cache is left untouched.
    pub async fn load(&self, symbol: &str) -> anyhow::Result<Arc<LoadedModel>> {
        // Loading may hit disk or network; do it without holding the lock.
        let model = Arc::new(self.loader.load(symbol).await?);
        tracing::debug!(
            symbol,
            sequence_length = model.metadata.sequence_length,
            prediction_days = model.metadata.prediction_days,
            "model loaded"
        );
        self.entries
            .lock()
            .await
            .insert(symbol.to_string(), model.clone());
        Ok(model)
    }

    /// Drops the cached model for `symbol`. Returns whether one was cached.
    pub async fn evict(&self, symbol: &str) -> bool {
        let removed = self.entries.lock().await.remove(symbol).is_some();
        if removed {
            tracing::debug!(symbol, "model evicted");
        }
        removed
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn loaded_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        out.sort();
        out
    }
}
