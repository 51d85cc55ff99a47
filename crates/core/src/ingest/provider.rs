use crate::config::Settings;
use crate::domain::series::PriceSeries;
use crate::domain::symbol::validate_symbol;
use crate::ingest::types::{ChartResponse, Quote};
use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RANGE: &str = "3mo";

/// Closes kept per symbol; older entries are dropped.
pub const HISTORY_CAP: usize = 500;

#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Latest quote plus daily closes, most-recent-last.
    async fn fetch_history(&self, symbol: &str) -> Result<(Quote, PriceSeries)>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    range: String,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .quote_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("QUOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let range = std::env::var("QUOTE_RANGE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RANGE.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build quote http client")?;

        Ok(Self {
            http,
            base_url,
            range,
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }
}

#[async_trait::async_trait]
impl HistoryProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_history(&self, symbol: &str) -> Result<(Quote, PriceSeries)> {
        validate_symbol(symbol)?;

        let res = self
            .http
            .get(self.url(symbol))
            .query(&[("range", self.range.as_str()), ("interval", "1d")])
            .send()
            .await
            .context("quote request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read quote response")?;
        let parsed = serde_json::from_str::<ChartResponse>(&text)
            .with_context(|| format!("quote response is not a chart document (HTTP {status}): {text}"))?;

        let out = parse_chart(symbol, parsed)?;
        if !status.is_success() {
            anyhow::bail!("quote HTTP {status} for {symbol}");
        }

        tracing::debug!(
            symbol,
            provider = self.provider_name(),
            closes = out.1.len(),
            "fetched price history"
        );
        Ok(out)
    }
}

fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<(Quote, PriceSeries)> {
    if let Some(err) = resp.chart.error {
        anyhow::bail!(
            "quote API error for {symbol}: {} ({})",
            err.description.as_deref().unwrap_or("unknown error"),
            err.code.as_deref().unwrap_or("-")
        );
    }

    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .with_context(|| format!("no data found for {symbol}"))?;

    let quote = Quote {
        symbol: result.meta.symbol.clone(),
        current_price: result.meta.regular_market_price,
        previous_close: result.meta.best_previous_close(),
    };

    let mut series = PriceSeries::default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    // Closes are oldest-first; missing sessions come through as null.
    for close in closes.into_iter().flatten() {
        series
            .push_capped(close, HISTORY_CAP)
            .with_context(|| format!("invalid close in quote history for {symbol}"))?;
    }

    Ok((quote, series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(v: serde_json::Value) -> ChartResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn parses_chart_and_drops_null_closes() {
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "AAPL",
                        "regularMarketPrice": 190.0,
                        "chartPreviousClose": 180.0
                    },
                    "indicators": {"quote": [{"close": [181.0, null, 185.5, 190.0]}]}
                }],
                "error": null
            }
        });

        let (quote, series) = parse_chart("AAPL", decode(v)).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.previous_close, Some(180.0));
        assert_eq!(quote.price_change(), Some(10.0));
        assert_eq!(series.as_slice(), &[181.0, 185.5, 190.0]);
        assert_eq!(series.latest(), Some(190.0));
    }

    #[test]
    fn prefers_previous_close_over_chart_previous_close() {
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "MSFT",
                        "regularMarketPrice": 100.0,
                        "previousClose": 98.0,
                        "chartPreviousClose": 90.0
                    },
                    "indicators": {"quote": [{"close": []}]}
                }]
            }
        });
        let (quote, series) = parse_chart("MSFT", decode(v)).unwrap();
        assert_eq!(quote.previous_close, Some(98.0));
        assert!(series.is_empty());
    }

    #[test]
    fn surfaces_api_errors() {
        let v = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        });
        let err = parse_chart("ZZZZ", decode(v)).unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn empty_result_is_an_error() {
        let v = json!({"chart": {"result": []}});
        assert!(parse_chart("AAPL", decode(v)).is_err());
    }

    #[test]
    fn history_is_capped() {
        let closes: Vec<f64> = (1..=(HISTORY_CAP + 10)).map(|i| i as f64).collect();
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL", "regularMarketPrice": 1.0},
                    "indicators": {"quote": [{"close": closes}]}
                }]
            }
        });
        let (quote, series) = parse_chart("AAPL", decode(v)).unwrap();
        assert_eq!(series.len(), HISTORY_CAP);
        assert_eq!(series.as_slice()[0], 11.0);
        assert_eq!(quote.percent_change(), None);
    }
}
