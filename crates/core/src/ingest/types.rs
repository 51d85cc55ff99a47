use serde::{Deserialize, Serialize};

/// Latest quote for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub current_price: f64,
    pub previous_close: Option<f64>,
}

impl Quote {
    pub fn price_change(&self) -> Option<f64> {
        Some(self.current_price - self.previous_close?)
    }

    pub fn percent_change(&self) -> Option<f64> {
        let previous = self.previous_close.filter(|p| *p > 0.0)?;
        Some((self.current_price - previous) / previous * 100.0)
    }
}

// Chart endpoint envelope. Only the fields we read are modelled.

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub regular_market_price: f64,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub chart_previous_close: Option<f64>,
}

impl ChartMeta {
    /// `previousClose` is only present for intraday ranges; fall back to the
    /// close before the chart window otherwise.
    pub fn best_previous_close(&self) -> Option<f64> {
        self.previous_close.or(self.chart_previous_close)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    pub quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}
