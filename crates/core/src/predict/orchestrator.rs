use crate::domain::forecast::{ForecastResult, ModelType};
use crate::domain::series::PriceSeries;
use crate::model::ModelPredictor;
use crate::predict::error::PredictionError;
use crate::predict::statistical::PricePredictor;
use std::sync::Arc;

const MODEL_CONFIDENCE_RANGE: (f64, f64) = (0.1, 0.9);

/// Chooses between a model-backed predictor and the statistical one.
///
/// Always yields a usable forecast: any model failure, including a panic
/// inside the model task, degrades to [`PricePredictor::predict`].
#[derive(Clone)]
pub struct PredictionOrchestrator {
    statistical: PricePredictor,
    model: Option<Arc<dyn ModelPredictor>>,
}

impl PredictionOrchestrator {
    pub fn new(statistical: PricePredictor) -> Self {
        Self {
            statistical,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn ModelPredictor>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub async fn predict(
        &self,
        symbol: &str,
        history: &PriceSeries,
        days_to_predict: usize,
        use_model: bool,
    ) -> ForecastResult {
        if !use_model {
            return self.statistical.predict(history, days_to_predict);
        }
        if !self.has_model() {
            tracing::debug!(symbol, "no model predictor configured; using statistical");
            return self.statistical.predict(history, days_to_predict);
        }

        self.try_model(symbol, history, days_to_predict)
            .await
            .map(|neural| {
                if tracing::enabled!(tracing::Level::DEBUG) {
                    let stat = self.statistical.predict(history, days_to_predict);
                    tracing::debug!(
                        symbol,
                        neural_prices = ?neural.predicted_prices,
                        neural_confidence = neural.confidence,
                        statistical_prices = ?stat.predicted_prices,
                        statistical_confidence = stat.confidence,
                        "model prediction succeeded; statistical result kept for comparison only"
                    );
                }
                neural
            })
            .unwrap_or_else(|err| {
                tracing::warn!(
                    symbol,
                    error = %err,
                    "model prediction failed; falling back to statistical"
                );
                self.statistical.predict(history, days_to_predict)
            })
    }

    async fn try_model(
        &self,
        symbol: &str,
        history: &PriceSeries,
        days_to_predict: usize,
    ) -> Result<ForecastResult, PredictionError> {
        let Some(model) = self.model.clone() else {
            return Err(PredictionError::ModelUnavailable {
                symbol: symbol.to_string(),
                detail: "no model predictor configured".to_string(),
            });
        };

        tracing::debug!(symbol, model = model.name(), "requesting model prediction");

        // Run on its own task so a panicking model surfaces as a JoinError.
        let task_symbol = symbol.to_string();
        let task_history = history.clone();
        let mut result = tokio::spawn(async move {
            model
                .predict(&task_symbol, &task_history, days_to_predict)
                .await
        })
        .await
        .map_err(|err| PredictionError::ModelTaskFailed {
            detail: err.to_string(),
        })??;

        if result.predicted_prices.is_empty() {
            return Err(PredictionError::EmptyOutput {
                symbol: symbol.to_string(),
            });
        }

        let (lo, hi) = MODEL_CONFIDENCE_RANGE;
        result.confidence = if result.confidence.is_finite() {
            result.confidence.clamp(lo, hi)
        } else {
            lo
        };
        result.model_type = ModelType::Neural;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Succeed,
        Fail,
        Empty,
        Panic,
    }

    struct FakeModel {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl FakeModel {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl ModelPredictor for FakeModel {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn predict(
            &self,
            symbol: &str,
            _history: &PriceSeries,
            days_to_predict: usize,
        ) -> Result<ForecastResult, PredictionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => Ok(ForecastResult {
                    predicted_prices: vec![42.0; days_to_predict],
                    confidence: 1.5,
                    model_type: ModelType::Statistical,
                }),
                Behaviour::Fail => Err(PredictionError::Inference {
                    symbol: symbol.to_string(),
                    detail: "boom".to_string(),
                }),
                Behaviour::Empty => Ok(ForecastResult {
                    predicted_prices: Vec::new(),
                    confidence: 0.7,
                    model_type: ModelType::Neural,
                }),
                Behaviour::Panic => panic!("model exploded"),
            }
        }
    }

    fn history() -> PriceSeries {
        PriceSeries::from_oldest_first((100..=110).map(f64::from).collect()).unwrap()
    }

    #[tokio::test]
    async fn uses_model_result_when_it_succeeds() {
        let model = FakeModel::new(Behaviour::Succeed);
        let orchestrator =
            PredictionOrchestrator::new(PricePredictor::default()).with_model(model.clone());

        let res = orchestrator.predict("AAPL", &history(), 5, true).await;
        assert_eq!(res.model_type, ModelType::Neural);
        assert_eq!(res.predicted_prices, vec![42.0; 5]);
        assert_eq!(res.confidence, 0.9);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn falls_back_when_model_fails_empties_or_panics() {
        let expected = PricePredictor::default().predict(&history(), 5);
        for behaviour in [Behaviour::Fail, Behaviour::Empty, Behaviour::Panic] {
            let orchestrator = PredictionOrchestrator::new(PricePredictor::default())
                .with_model(FakeModel::new(behaviour));
            let res = orchestrator.predict("AAPL", &history(), 5, true).await;
            assert_eq!(res, expected);
            assert_eq!(res.model_type, ModelType::Statistical);
        }
    }

    #[tokio::test]
    async fn skips_model_when_not_requested() {
        let model = FakeModel::new(Behaviour::Succeed);
        let orchestrator =
            PredictionOrchestrator::new(PricePredictor::default()).with_model(model.clone());

        let res = orchestrator.predict("AAPL", &history(), 5, false).await;
        assert_eq!(res.model_type, ModelType::Statistical);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn requested_model_without_configuration_is_statistical() {
        let orchestrator = PredictionOrchestrator::new(PricePredictor::default());
        assert!(!orchestrator.has_model());
        let res = orchestrator.predict("AAPL", &history(), 3, true).await;
        assert_eq!(res.model_type, ModelType::Statistical);
        assert_eq!(res.predicted_prices.len(), 3);
    }
}
