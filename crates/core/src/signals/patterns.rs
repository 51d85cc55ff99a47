use crate::signals::indicators::sma;
use serde::{Deserialize, Serialize};

const SHORT_WINDOW: usize = 5;
const LONG_WINDOW: usize = 20;
const BREAKOUT_FACTOR: f64 = 1.02;
const BREAKDOWN_FACTOR: f64 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Breakout,
    Breakdown,
    Bullish,
    Bearish,
}

fn tail(closes: &[f64], n: usize) -> &[f64] {
    &closes[closes.len().saturating_sub(n)..]
}

fn short_vs_long(closes: &[f64]) -> Option<(f64, f64)> {
    if closes.len() < SHORT_WINDOW {
        return None;
    }
    Some((sma(tail(closes, SHORT_WINDOW))?, sma(tail(closes, LONG_WINDOW))?))
}

pub fn is_bullish_trend(closes: &[f64]) -> bool {
    matches!(short_vs_long(closes), Some((short, long)) if short > long)
}

pub fn is_bearish_trend(closes: &[f64]) -> bool {
    matches!(short_vs_long(closes), Some((short, long)) if short < long)
}

/// Current price more than 2% above the recent 20-day high.
pub fn is_breakout(current_price: f64, closes: &[f64]) -> bool {
    if closes.len() < LONG_WINDOW {
        return false;
    }
    let high = tail(closes, LONG_WINDOW)
        .iter()
        .copied()
        .fold(f64::MIN, f64::max);
    current_price > high * BREAKOUT_FACTOR
}

/// Current price more than 2% below the recent 20-day low.
pub fn is_breakdown(current_price: f64, closes: &[f64]) -> bool {
    if closes.len() < LONG_WINDOW {
        return false;
    }
    let low = tail(closes, LONG_WINDOW)
        .iter()
        .copied()
        .fold(f64::MAX, f64::min);
    current_price < low * BREAKDOWN_FACTOR
}

/// First matching pattern in priority order: breakout, breakdown, bullish,
/// bearish. Needs at least 20 closes.
pub fn detect(current_price: f64, closes: &[f64]) -> Option<Pattern> {
    if closes.len() < LONG_WINDOW {
        return None;
    }

    if is_breakout(current_price, closes) {
        Some(Pattern::Breakout)
    } else if is_breakdown(current_price, closes) {
        Some(Pattern::Breakdown)
    } else if is_bullish_trend(closes) {
        Some(Pattern::Bullish)
    } else if is_bearish_trend(closes) {
        Some(Pattern::Bearish)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_needs_five_points() {
        assert!(!is_bullish_trend(&[1.0, 2.0, 3.0, 4.0]));
        assert!(!is_bearish_trend(&[4.0, 3.0, 2.0, 1.0]));
    }

    #[test]
    fn rising_closes_are_bullish() {
        let closes: Vec<f64> = (1..=25).map(f64::from).collect();
        assert!(is_bullish_trend(&closes));
        assert!(!is_bearish_trend(&closes));
        assert_eq!(detect(25.0, &closes), Some(Pattern::Bullish));
    }

    #[test]
    fn breakout_and_breakdown_take_priority() {
        let closes = vec![100.0; 20];
        assert_eq!(detect(103.0, &closes), Some(Pattern::Breakout));
        assert_eq!(detect(97.0, &closes), Some(Pattern::Breakdown));
        assert_eq!(detect(101.0, &closes), None);
    }

    #[test]
    fn detect_requires_twenty_closes() {
        let closes = vec![100.0; 19];
        assert_eq!(detect(200.0, &closes), None);
    }
}
