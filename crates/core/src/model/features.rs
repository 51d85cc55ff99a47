use crate::model::ModelMetadata;
use crate::signals::indicators::{macd, rsi, MACD_SLOW, RSI_PERIOD};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

pub const NUM_FEATURES: usize = 12;

/// Roughly two years of trading days.
const TWO_YEAR_WINDOW: usize = 252 * 2;

// Market-wide inputs the model was trained with but that we have no feed for.
const SP500_PLACEHOLDER: f32 = 0.5;
const VIX_PLACEHOLDER: f32 = 0.2;

/// Model input: one row of [`NUM_FEATURES`] values per day, oldest row first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureMatrix(pub Vec<[f32; NUM_FEATURES]>);

impl FeatureMatrix {
    pub fn rows(&self) -> usize {
        self.0.len()
    }
}

/// Builds the input matrix from the last `metadata.sequence_length` closes.
///
/// Calendar features start at `start_date` and advance one day per row.
/// Callers must supply at least `sequence_length` closes.
pub fn build(closes: &[f64], metadata: &ModelMetadata, start_date: NaiveDate) -> FeatureMatrix {
    let window = &closes[closes.len().saturating_sub(metadata.sequence_length)..];
    let (two_year_high, two_year_low) = two_year_high_low(window);

    let mut rows = Vec::with_capacity(window.len());
    for (i, &close) in window.iter().enumerate() {
        let date = start_date + Duration::days(i as i64);

        let rsi_window = &window[(i + 1).saturating_sub(RSI_PERIOD)..=i];
        let macd_window = &window[(i + 1).saturating_sub(MACD_SLOW)..=i];
        let macd_value = macd(macd_window);
        let signal = macd_value * 0.9;

        let drawdown = if two_year_high > 0.0 {
            (close - two_year_high) / two_year_high
        } else {
            0.0
        };

        rows.push([
            metadata.normalize(close) as f32,
            (rsi(rsi_window) / 100.0) as f32,
            unit_interval((macd_value + 5.0) / 10.0),
            unit_interval((signal + 5.0) / 10.0),
            SP500_PLACEHOLDER,
            VIX_PLACEHOLDER,
            metadata.normalize(two_year_high) as f32,
            metadata.normalize(two_year_low) as f32,
            unit_interval((drawdown + 1.0) / 2.0),
            (date.month() as f64 / 12.0) as f32,
            (date.weekday().num_days_from_sunday() as f64 / 6.0) as f32,
            if is_holiday_period(date) { 1.0 } else { 0.0 },
        ]);
    }

    FeatureMatrix(rows)
}

fn unit_interval(v: f64) -> f32 {
    v.clamp(0.0, 1.0) as f32
}

fn two_year_high_low(closes: &[f64]) -> (f64, f64) {
    if closes.is_empty() {
        return (0.0, 0.0);
    }
    let recent = &closes[closes.len().saturating_sub(TWO_YEAR_WINDOW)..];
    let high = recent.iter().copied().fold(f64::MIN, f64::max);
    let low = recent.iter().copied().fold(f64::MAX, f64::min);
    (high, low)
}

fn is_holiday_period(date: NaiveDate) -> bool {
    (date.month() == 12 && date.day() >= 20) || (date.month() == 1 && date.day() <= 10)
}
