use crate::config::Settings;
use crate::domain::forecast::{Direction, ForecastResult};
use crate::domain::series::PriceSeries;
use crate::ingest::provider::{HistoryProvider, YahooChartProvider};
use crate::ingest::types::Quote;
use crate::model::{DirectoryModelLoader, ModelCache, NeuralPredictor};
use crate::predict::{PredictionOrchestrator, PricePredictor, PredictorParams};
use crate::signals::patterns::{self, Pattern};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Forecast for one symbol, ready to hand to a renderer or alert dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolForecast {
    pub symbol: String,
    pub quote: Option<Quote>,
    pub history_len: usize,
    pub forecast: ForecastResult,
    pub direction: Direction,
    pub pattern: Option<Pattern>,
}

/// Wires history fetching, pattern detection and the prediction orchestrator.
#[derive(Clone)]
pub struct ForecastService {
    orchestrator: PredictionOrchestrator,
    history: Arc<dyn HistoryProvider>,
    models: Option<Arc<ModelCache>>,
}

impl ForecastService {
    pub fn new(orchestrator: PredictionOrchestrator, history: Arc<dyn HistoryProvider>) -> Self {
        Self {
            orchestrator,
            history,
            models: None,
        }
    }

    /// Routes model predictions through `cache`.
    pub fn with_models(mut self, cache: Arc<ModelCache>) -> Self {
        let neural = NeuralPredictor::new(cache.clone());
        self.orchestrator = self.orchestrator.with_model(Arc::new(neural));
        self.models = Some(cache);
        self
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let params = PredictorParams::from_env();
        params.validate().context("invalid predictor parameters")?;

        let orchestrator = PredictionOrchestrator::new(PricePredictor::new(params));
        let history = Arc::new(YahooChartProvider::from_settings(settings)?);
        let service = Self::new(orchestrator, history);

        if !settings.model_configured() {
            tracing::info!("model path not configured; statistical predictions only");
            return Ok(service);
        }

        let loader = DirectoryModelLoader::from_settings(settings)?;
        let cache = Arc::new(ModelCache::new(Arc::new(loader)));
        Ok(service.with_models(cache))
    }

    pub fn models(&self) -> Option<&Arc<ModelCache>> {
        self.models.as_ref()
    }

    pub async fn forecast_series(
        &self,
        symbol: &str,
        history: &PriceSeries,
        days_to_predict: usize,
        use_model: bool,
    ) -> SymbolForecast {
        let forecast = self
            .orchestrator
            .predict(symbol, history, days_to_predict, use_model)
            .await;
        let pattern = history
            .latest()
            .and_then(|current| patterns::detect(current, history.as_slice()));

        SymbolForecast {
            symbol: symbol.to_string(),
            quote: None,
            history_len: history.len(),
            direction: forecast.direction(),
            forecast,
            pattern,
        }
    }

    /// Fetches history for `symbol` and forecasts it.
    pub async fn forecast_symbol(
        &self,
        symbol: &str,
        days_to_predict: usize,
        use_model: bool,
    ) -> anyhow::Result<SymbolForecast> {
        let (quote, history) = self
            .history
            .fetch_history(symbol)
            .await
            .with_context(|| format!("failed to fetch history for {symbol}"))?;

        let mut out = self
            .forecast_series(symbol, &history, days_to_predict, use_model)
            .await;
        out.pattern = patterns::detect(quote.current_price, history.as_slice());
        out.quote = Some(quote);
        Ok(out)
    }

    pub async fn detect_pattern(&self, symbol: &str) -> anyhow::Result<(Quote, Option<Pattern>)> {
        let (quote, history) = self
            .history
            .fetch_history(symbol)
            .await
            .with_context(|| format!("failed to fetch history for {symbol}"))?;
        let pattern = patterns::detect(quote.current_price, history.as_slice());
        Ok((quote, pattern))
    }
}
