use std::fmt;

/// Errors at the prediction seam.
///
/// The statistical predictor never produces these for valid series; they come
/// from input validation and from the model-backed path, where the
/// orchestrator converts every one of them into a statistical fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionError {
    InvalidPrice { index: usize, value: f64 },
    InsufficientHistory { required: usize, actual: usize },
    ModelUnavailable { symbol: String, detail: String },
    Inference { symbol: String, detail: String },
    EmptyOutput { symbol: String },
    ModelTaskFailed { detail: String },
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionError::InvalidPrice { index, value } => {
                write!(f, "invalid close at index {index}: {value}")
            }
            PredictionError::InsufficientHistory { required, actual } => write!(
                f,
                "insufficient history: need {required} closes, got {actual}"
            ),
            PredictionError::ModelUnavailable { symbol, detail } => {
                write!(f, "model unavailable (symbol={symbol}): {detail}")
            }
            PredictionError::Inference { symbol, detail } => {
                write!(f, "model inference failed (symbol={symbol}): {detail}")
            }
            PredictionError::EmptyOutput { symbol } => {
                write!(f, "model produced no predictions (symbol={symbol})")
            }
            PredictionError::ModelTaskFailed { detail } => {
                write!(f, "model task failed: {detail}")
            }
        }
    }
}

impl std::error::Error for PredictionError {}
