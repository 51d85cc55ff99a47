use anyhow::Context;
use bassbroker_core::domain::series::PriceSeries;
use std::collections::BTreeMap;
use std::path::Path;

/// Parses `{"SYMBOL": [close, ...], ...}` with closes oldest-first.
pub fn parse(text: &str) -> anyhow::Result<BTreeMap<String, PriceSeries>> {
    let raw = serde_json::from_str::<BTreeMap<String, Vec<f64>>>(text)
        .context("history file must be a JSON object of symbol -> closes")?;

    let mut out = BTreeMap::new();
    for (symbol, closes) in raw {
        let symbol = symbol.trim().to_string();
        anyhow::ensure!(!symbol.is_empty(), "history file contains an empty symbol");
        let series = PriceSeries::from_oldest_first(closes)
            .with_context(|| format!("invalid closes for {symbol}"))?;
        out.insert(symbol, series);
    }
    Ok(out)
}

pub fn load(path: &Path) -> anyhow::Result<BTreeMap<String, PriceSeries>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history file {}", path.display()))?;
    parse(&text)
}
