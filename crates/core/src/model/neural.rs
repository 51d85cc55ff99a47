use crate::domain::forecast::{ForecastResult, ModelType};
use crate::domain::series::PriceSeries;
use crate::model::cache::ModelCache;
use crate::model::{features, ModelPredictor};
use crate::predict::error::PredictionError;
use chrono::NaiveDate;
use std::sync::Arc;

const DEFAULT_CONFIDENCE: f64 = 0.7;

// Outputs are clamped to within +/-50% of the last observed close.
const MAX_UP_FACTOR: f64 = 1.5;
const MAX_DOWN_FACTOR: f64 = 0.5;

/// [`ModelPredictor`] over per-symbol models held in a [`ModelCache`].
pub struct NeuralPredictor {
    cache: Arc<ModelCache>,
    confidence: f64,
    start_date: Option<NaiveDate>,
}

impl NeuralPredictor {
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self {
            cache,
            confidence: DEFAULT_CONFIDENCE,
            start_date: None,
        }
    }

    /// Pins the first calendar date of the feature window instead of today.
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }
}

#[async_trait::async_trait]
impl ModelPredictor for NeuralPredictor {
    fn name(&self) -> &'static str {
        "neural"
    }

    async fn predict(
        &self,
        symbol: &str,
        history: &PriceSeries,
        days_to_predict: usize,
    ) -> Result<ForecastResult, PredictionError> {
        let model = self.cache.get_or_load(symbol).await.map_err(|err| {
            PredictionError::ModelUnavailable {
                symbol: symbol.to_string(),
                detail: format!("{err:#}"),
            }
        })?;
        let metadata = &model.metadata;

        if history.len() < metadata.sequence_length {
            return Err(PredictionError::InsufficientHistory {
                required: metadata.sequence_length,
                actual: history.len(),
            });
        }
        let last_close = history.latest().unwrap_or_default();

        let start_date = self
            .start_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let input = features::build(history.as_slice(), metadata, start_date);

        let outputs = model
            .backend
            .infer(&input)
            .await
            .map_err(|err| PredictionError::Inference {
                symbol: symbol.to_string(),
                detail: format!("{err:#}"),
            })?;

        let take = days_to_predict
            .min(metadata.prediction_days)
            .min(outputs.len());
        if take == 0 {
            return Err(PredictionError::EmptyOutput {
                symbol: symbol.to_string(),
            });
        }

        let lo = last_close * MAX_DOWN_FACTOR;
        let hi = last_close * MAX_UP_FACTOR;
        let mut predicted_prices = Vec::with_capacity(take);
        for &output in &outputs[..take] {
            let raw = metadata.denormalize(output as f64);
            if !raw.is_finite() {
                return Err(PredictionError::Inference {
                    symbol: symbol.to_string(),
                    detail: format!("non-finite model output: {output}"),
                });
            }

            let sanitized = raw.clamp(lo, hi);
            if sanitized != raw {
                tracing::warn!(symbol, raw, sanitized, "clamped unreasonable model prediction");
            }
            predicted_prices.push(sanitized);
        }

        Ok(ForecastResult {
            predicted_prices,
            confidence: self.confidence,
            model_type: ModelType::Neural,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureMatrix, LoadedModel, ModelBackend, ModelLoader, ModelMetadata};

    struct FixedBackend {
        outputs: Vec<f32>,
        expected_rows: usize,
    }

    #[async_trait::async_trait]
    impl ModelBackend for FixedBackend {
        async fn infer(&self, input: &FeatureMatrix) -> anyhow::Result<Vec<f32>> {
            anyhow::ensure!(input.rows() == self.expected_rows, "wrong row count");
            Ok(self.outputs.clone())
        }
    }

    struct FixedLoader {
        outputs: Vec<f32>,
    }

    #[async_trait::async_trait]
    impl ModelLoader for FixedLoader {
        async fn load(&self, symbol: &str) -> anyhow::Result<LoadedModel> {
            anyhow::ensure!(symbol == "AAPL", "no model for {symbol}");
            Ok(LoadedModel {
                metadata: ModelMetadata {
                    min_price: 0.0,
                    max_price: 200.0,
                    sequence_length: 10,
                    prediction_days: 35,
                },
                backend: Arc::new(FixedBackend {
                    outputs: self.outputs.clone(),
                    expected_rows: 10,
                }),
            })
        }
    }

    fn predictor(outputs: Vec<f32>) -> NeuralPredictor {
        let cache = Arc::new(ModelCache::new(Arc::new(FixedLoader { outputs })));
        NeuralPredictor::new(cache).with_start_date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
    }

    fn history(len: usize) -> PriceSeries {
        PriceSeries::from_oldest_first(vec![100.0; len]).unwrap()
    }

    #[tokio::test]
    async fn denormalizes_and_truncates_to_horizon() {
        let p = predictor(vec![0.5, 0.505, 0.51, 0.515, 0.52, 0.525, 0.53]);
        let res = p.predict("AAPL", &history(20), 5).await.unwrap();
        assert_eq!(res.predicted_prices.len(), 5);
        assert!((res.predicted_prices[0] - 100.0).abs() < 1e-4);
        assert!((res.predicted_prices[4] - 104.0).abs() < 1e-4);
        assert_eq!(res.confidence, 0.7);
        assert_eq!(res.model_type, ModelType::Neural);
    }

    #[tokio::test]
    async fn clamps_to_half_and_one_and_a_half_of_last_close() {
        let p = predictor(vec![1.0, 0.0]);
        let res = p.predict("AAPL", &history(10), 5).await.unwrap();
        assert_eq!(res.predicted_prices, vec![150.0, 50.0]);
    }

    #[tokio::test]
    async fn short_history_and_missing_model_are_errors() {
        let p = predictor(vec![0.5]);
        let err = p.predict("AAPL", &history(9), 5).await.unwrap_err();
        assert_eq!(
            err,
            PredictionError::InsufficientHistory {
                required: 10,
                actual: 9
            }
        );

        let err = p.predict("TSLA", &history(20), 5).await.unwrap_err();
        assert!(matches!(err, PredictionError::ModelUnavailable { .. }));
    }

    #[tokio::test]
    async fn empty_and_non_finite_outputs_are_errors() {
        let err = predictor(Vec::new())
            .predict("AAPL", &history(10), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PredictionError::EmptyOutput { .. }));

        let err = predictor(vec![f32::NAN])
            .predict("AAPL", &history(10), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PredictionError::Inference { .. }));
    }
}
