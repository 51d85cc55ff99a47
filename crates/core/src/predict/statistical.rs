use crate::domain::forecast::{ForecastResult, ModelType};
use crate::domain::series::PriceSeries;

pub const DEFAULT_DAYS_TO_PREDICT: usize = 5;

/// Tuning constants for the statistical model. Hand-picked heuristics, not
/// fitted values.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorParams {
    /// Number of most recent closes the metrics are computed over.
    pub window: usize,

    /// Below this many closes the predictor returns the insufficient-data result.
    pub min_history: usize,

    /// Confidence reported alongside an insufficient-data result.
    pub insufficient_confidence: f64,

    pub momentum_short_weight: f64,
    pub momentum_long_weight: f64,

    /// Multiplier applied to volatility before it is subtracted from 1.
    pub volatility_scale: f64,
    pub volatility_factor_range: (f64, f64),

    pub volatility_blend: f64,
    pub consistency_blend: f64,
    pub confidence_range: (f64, f64),

    /// Per-day decay rate: `decay_i = 1 / (1 + decay_rate * i)`.
    pub decay_rate: f64,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            window: 10,
            min_history: 5,
            insufficient_confidence: 0.3,
            momentum_short_weight: 0.7,
            momentum_long_weight: 0.3,
            volatility_scale: 10.0,
            volatility_factor_range: (0.2, 0.9),
            volatility_blend: 0.5,
            consistency_blend: 0.5,
            confidence_range: (0.1, 0.9),
            decay_rate: 0.1,
        }
    }
}

impl PredictorParams {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("PREDICTOR_WINDOW") {
            if let Ok(n) = s.parse::<usize>() {
                out.window = n;
            }
        }

        if let Ok(s) = std::env::var("PREDICTOR_MIN_HISTORY") {
            if let Ok(n) = s.parse::<usize>() {
                out.min_history = n;
            }
        }

        if let Ok(s) = std::env::var("PREDICTOR_DECAY_RATE") {
            if let Ok(n) = s.parse::<f64>() {
                out.decay_rate = n;
            }
        }

        out
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.window >= 1, "PREDICTOR_WINDOW must be >= 1");
        anyhow::ensure!(self.min_history >= 1, "PREDICTOR_MIN_HISTORY must be >= 1");
        anyhow::ensure!(
            self.decay_rate.is_finite() && self.decay_rate >= 0.0,
            "PREDICTOR_DECAY_RATE must be finite and >= 0 (got {})",
            self.decay_rate
        );
        anyhow::ensure!(
            self.volatility_factor_range.0 <= self.volatility_factor_range.1,
            "volatility factor range is inverted"
        );
        anyhow::ensure!(
            self.confidence_range.0 <= self.confidence_range.1,
            "confidence range is inverted"
        );
        Ok(())
    }
}

/// Statistics derived from the recent window of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesMetrics {
    pub trend: f64,
    pub volatility: f64,
    pub momentum: f64,
    pub consistency: f64,
}

/// Trend/momentum extrapolation over daily closes.
///
/// Pure and stateless between calls; a single instance can be shared across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct PricePredictor {
    params: PredictorParams,
}

impl PricePredictor {
    pub fn new(params: PredictorParams) -> Self {
        Self { params }
    }

    pub fn predict(&self, history: &PriceSeries, days_to_predict: usize) -> ForecastResult {
        let p = &self.params;

        if history.len() < p.min_history {
            tracing::debug!(
                history_len = history.len(),
                min_history = p.min_history,
                "not enough price history for statistical prediction"
            );
            return ForecastResult {
                predicted_prices: Vec::new(),
                confidence: p.insufficient_confidence,
                model_type: ModelType::Statistical,
            };
        }

        let recent = history.tail(p.window);
        let metrics = self.metrics(recent);
        let confidence = self.confidence(metrics.volatility, metrics.consistency);

        let mut last_price = history.latest().unwrap_or_default();
        let mut predicted_prices = Vec::with_capacity(days_to_predict);
        for day in 1..=days_to_predict {
            let decay = 1.0 / (1.0 + p.decay_rate * day as f64);
            let change_rate = metrics.trend * decay + metrics.momentum * (1.0 - decay);
            let mut price = last_price * (1.0 + change_rate);
            if !price.is_finite() {
                price = last_price;
            }
            predicted_prices.push(price);
            last_price = price;
        }

        tracing::debug!(
            trend = metrics.trend,
            volatility = metrics.volatility,
            momentum = metrics.momentum,
            consistency = metrics.consistency,
            confidence,
            days_to_predict,
            "statistical prediction computed"
        );

        ForecastResult {
            predicted_prices,
            confidence,
            model_type: ModelType::Statistical,
        }
    }

    pub fn metrics(&self, recent: &[f64]) -> SeriesMetrics {
        SeriesMetrics {
            trend: weighted_trend(recent),
            volatility: volatility(recent),
            momentum: self.momentum(recent),
            consistency: consistency(recent),
        }
    }

    fn momentum(&self, prices: &[f64]) -> f64 {
        if prices.len() < 5 {
            return 0.0;
        }

        let last = prices[prices.len() - 1];
        let short_term = relative_change(prices[prices.len() - 3], last);
        let long_term = relative_change(prices[0], last);

        short_term * self.params.momentum_short_weight
            + long_term * self.params.momentum_long_weight
    }

    pub fn confidence(&self, volatility: f64, consistency: f64) -> f64 {
        let p = &self.params;
        let (vol_lo, vol_hi) = p.volatility_factor_range;
        let (conf_lo, conf_hi) = p.confidence_range;

        let volatility_factor = (1.0 - volatility * p.volatility_scale).clamp(vol_lo, vol_hi);
        let value = volatility_factor * p.volatility_blend + consistency * p.consistency_blend;
        value.clamp(conf_lo, conf_hi)
    }
}

/// `(current - previous) / previous`, or 0 when the denominator is not
/// positive or the quotient overflows.
pub fn relative_change(previous: f64, current: f64) -> f64 {
    if previous <= 0.0 {
        return 0.0;
    }
    let change = (current - previous) / previous;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

/// Recency-weighted mean of relative changes; pair `i` (1-based) has weight `i`.
pub fn weighted_trend(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for (i, pair) in prices.windows(2).enumerate() {
        let weight = (i + 1) as f64;
        weighted_sum += relative_change(pair[0], pair[1]) * weight;
        weight_sum += weight;
    }

    if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        0.0
    }
}

/// Mean absolute relative change between consecutive closes.
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let total: f64 = prices
        .windows(2)
        .map(|pair| relative_change(pair[0], pair[1]).abs())
        .sum();
    total / (prices.len() - 1) as f64
}

/// Fraction of consecutive delta pairs that move in the same strict direction.
/// Flat deltas never count as persistence.
pub fn consistency(prices: &[f64]) -> f64 {
    if prices.len() < 3 {
        return 0.5;
    }

    let mut same_direction = 0usize;
    let mut total = 0usize;
    for triple in prices.windows(3) {
        let prior = triple[1] - triple[0];
        let latest = triple[2] - triple[1];
        if (latest > 0.0 && prior > 0.0) || (latest < 0.0 && prior < 0.0) {
            same_direction += 1;
        }
        total += 1;
    }

    same_direction as f64 / total as f64
}
