use crate::predict::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Daily closing prices, ordered most-recent-last.
///
/// Every entry is finite and non-negative. Zero is allowed; the predictor
/// treats a zero denominator as a zero-change term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PriceSeries {
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Builds a series from closes given oldest-first.
    pub fn from_oldest_first(closes: Vec<f64>) -> Result<Self, PredictionError> {
        for (index, &value) in closes.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(PredictionError::InvalidPrice { index, value });
            }
        }
        Ok(Self { closes })
    }

    /// Builds a series from closes given newest-first (index 0 is the most
    /// recent close). The input is reversed so the series is most-recent-last.
    pub fn from_newest_first(mut closes: Vec<f64>) -> Result<Self, PredictionError> {
        let len = closes.len();
        closes.reverse();
        Self::from_oldest_first(closes).map_err(|err| match err {
            // Report the position in the caller's ordering.
            PredictionError::InvalidPrice { index, value } => PredictionError::InvalidPrice {
                index: len - 1 - index,
                value,
            },
            other => other,
        })
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.closes
    }

    /// The most recent close.
    pub fn latest(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// The last `n` closes (or all of them when shorter), still most-recent-last.
    pub fn tail(&self, n: usize) -> &[f64] {
        let start = self.closes.len().saturating_sub(n);
        &self.closes[start..]
    }

    /// Appends a new most-recent close, dropping the oldest entries beyond `cap`.
    pub fn push_capped(&mut self, close: f64, cap: usize) -> Result<(), PredictionError> {
        if !close.is_finite() || close < 0.0 {
            return Err(PredictionError::InvalidPrice {
                index: self.closes.len(),
                value: close,
            });
        }
        self.closes.push(close);
        if self.closes.len() > cap {
            let excess = self.closes.len() - cap;
            self.closes.drain(..excess);
        }
        Ok(())
    }
}

impl TryFrom<Vec<f64>> for PriceSeries {
    type Error = PredictionError;

    fn try_from(closes: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_oldest_first(closes)
    }
}

impl From<PriceSeries> for Vec<f64> {
    fn from(series: PriceSeries) -> Self {
        series.closes
    }
}
