//! Plumbing around an externally served price model.
//!
//! The network itself is opaque: a [`ModelBackend`] takes a feature matrix and
//! returns normalized outputs. Everything around it (metadata, feature
//! preparation, output sanitizing, per-symbol caching) lives here.

pub mod cache;
pub mod features;
pub mod loader;
pub mod neural;
pub mod serving;

use crate::domain::forecast::ForecastResult;
use crate::domain::series::PriceSeries;
use crate::predict::error::PredictionError;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use cache::{ModelCache, ModelLoader};
pub use features::FeatureMatrix;
pub use loader::DirectoryModelLoader;
pub use neural::NeuralPredictor;

/// A predictor backed by something other than the statistical model.
#[async_trait::async_trait]
pub trait ModelPredictor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn predict(
        &self,
        symbol: &str,
        history: &PriceSeries,
        days_to_predict: usize,
    ) -> Result<ForecastResult, PredictionError>;
}

/// Runs inference for one symbol's model.
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Returns the normalized price outputs for the given input window.
    async fn infer(&self, input: &FeatureMatrix) -> anyhow::Result<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub min_price: f64,
    pub max_price: f64,
    pub sequence_length: usize,
    pub prediction_days: usize,
}

impl ModelMetadata {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.min_price.is_finite() && self.max_price.is_finite(),
            "model price range must be finite"
        );
        ensure!(
            self.max_price > self.min_price,
            "max_price must exceed min_price (min={}, max={})",
            self.min_price,
            self.max_price
        );
        ensure!(self.sequence_length >= 1, "sequence_length must be >= 1");
        ensure!(self.prediction_days >= 1, "prediction_days must be >= 1");
        Ok(())
    }

    pub fn normalize(&self, price: f64) -> f64 {
        (price - self.min_price) / (self.max_price - self.min_price)
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        value * (self.max_price - self.min_price) + self.min_price
    }
}

/// A model ready for inference: its metadata plus the backend that serves it.
#[derive(Clone)]
pub struct LoadedModel {
    pub metadata: ModelMetadata,
    pub backend: Arc<dyn ModelBackend>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_metadata_document() {
        let v = json!({
            "min_price": 120.5,
            "max_price": 240.0,
            "sequence_length": 60,
            "prediction_days": 35
        });
        let meta: ModelMetadata = serde_json::from_value(v).unwrap();
        assert!(meta.validate().is_ok());
        assert_eq!(meta.sequence_length, 60);
    }

    #[test]
    fn rejects_inverted_price_range() {
        let meta = ModelMetadata {
            min_price: 10.0,
            max_price: 10.0,
            sequence_length: 5,
            prediction_days: 5,
        };
        assert!(meta.validate().is_err());
    }

    #[test]
    fn normalize_and_denormalize_are_inverse() {
        let meta = ModelMetadata {
            min_price: 100.0,
            max_price: 200.0,
            sequence_length: 5,
            prediction_days: 5,
        };
        assert_eq!(meta.normalize(150.0), 0.5);
        assert_eq!(meta.denormalize(0.25), 125.0);
    }
}
