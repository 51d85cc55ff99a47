//! Classic price indicators over closes ordered most-recent-last.

use anyhow::ensure;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;

pub fn sma(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Exponential moving average series, seeded with the SMA of the first
/// `period` values. The output has `values.len() - period + 1` entries.
pub fn ema(values: &[f64], period: usize) -> anyhow::Result<Vec<f64>> {
    ensure!(period >= 1, "EMA period must be >= 1");
    ensure!(
        values.len() >= period,
        "not enough data points for EMA period {period} (got {})",
        values.len()
    );

    let smoothing = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out.push(prev);

    for &value in &values[period..] {
        prev = (value - prev) * smoothing + prev;
        out.push(prev);
    }

    Ok(out)
}

/// RSI from simple average gains and losses across the whole slice.
/// Returns the neutral 50 when fewer than [`RSI_PERIOD`] points are given.
pub fn rsi(values: &[f64]) -> f64 {
    if values.len() < RSI_PERIOD {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in values.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let n = (values.len() - 1) as f64;
    let avg_gain = gains / n;
    let avg_loss = losses / n;
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// MACD line (EMA12 - EMA26) at the last point, or 0 with fewer than 26 points.
pub fn macd(values: &[f64]) -> f64 {
    if values.len() < MACD_SLOW {
        return 0.0;
    }

    match (ema(values, MACD_FAST), ema(values, MACD_SLOW)) {
        (Ok(fast), Ok(slow)) => match (fast.last(), slow.last()) {
            (Some(f), Some(s)) => f - s,
            _ => 0.0,
        },
        _ => 0.0,
    }
}
