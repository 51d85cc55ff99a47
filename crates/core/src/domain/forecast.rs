use serde::{Deserialize, Serialize};

/// Which predictor produced a forecast. Bookkeeping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Statistical,
    Neural,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Statistical => "statistical",
            ModelType::Neural => "neural",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    StronglyUp,
    Up,
    Neutral,
    Down,
    StronglyDown,
}

const STRONG_MOVE_PCT: f64 = 3.0;
const MOVE_PCT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predicted_prices: Vec<f64>,
    pub confidence: f64,
    pub model_type: ModelType,
}

impl ForecastResult {
    /// An empty prediction list means "insufficient data", not a failure.
    pub fn is_insufficient(&self) -> bool {
        self.predicted_prices.is_empty()
    }

    /// Percent change from the first to the last predicted price.
    pub fn percent_change(&self) -> Option<f64> {
        let first = *self.predicted_prices.first()?;
        let last = *self.predicted_prices.last()?;
        if first <= 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }

    pub fn direction(&self) -> Direction {
        let Some(pct) = self.percent_change() else {
            return Direction::Neutral;
        };

        if pct > STRONG_MOVE_PCT {
            Direction::StronglyUp
        } else if pct > MOVE_PCT {
            Direction::Up
        } else if pct < -STRONG_MOVE_PCT {
            Direction::StronglyDown
        } else if pct < -MOVE_PCT {
            Direction::Down
        } else {
            Direction::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(prices: &[f64]) -> ForecastResult {
        ForecastResult {
            predicted_prices: prices.to_vec(),
            confidence: 0.5,
            model_type: ModelType::Statistical,
        }
    }

    #[test]
    fn classifies_direction_thresholds() {
        assert_eq!(forecast(&[100.0, 103.5]).direction(), Direction::StronglyUp);
        assert_eq!(forecast(&[100.0, 102.0]).direction(), Direction::Up);
        assert_eq!(forecast(&[100.0, 100.5]).direction(), Direction::Neutral);
        assert_eq!(forecast(&[100.0, 98.0]).direction(), Direction::Down);
        assert_eq!(forecast(&[100.0, 96.0]).direction(), Direction::StronglyDown);
    }

    #[test]
    fn exact_thresholds_are_not_crossed() {
        assert_eq!(forecast(&[100.0, 101.0]).direction(), Direction::Neutral);
        assert_eq!(forecast(&[100.0, 99.0]).direction(), Direction::Neutral);
    }

    #[test]
    fn empty_or_zero_based_forecast_is_neutral() {
        assert_eq!(forecast(&[]).direction(), Direction::Neutral);
        assert_eq!(forecast(&[0.0, 5.0]).direction(), Direction::Neutral);
        assert!(forecast(&[]).is_insufficient());
    }

    #[test]
    fn model_type_serializes_lowercase() {
        let json = serde_json::to_value(ModelType::Statistical).unwrap();
        assert_eq!(json, serde_json::json!("statistical"));
        assert_eq!(ModelType::Neural.as_str(), "neural");
    }
}
