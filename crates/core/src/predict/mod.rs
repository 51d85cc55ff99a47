pub mod error;
pub mod orchestrator;
pub mod statistical;

pub use error::PredictionError;
pub use orchestrator::PredictionOrchestrator;
pub use statistical::{PricePredictor, PredictorParams, DEFAULT_DAYS_TO_PREDICT};
