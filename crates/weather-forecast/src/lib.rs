//! Per-(city, date) ensemble forecasting: source fetch with per-call
//! timeouts, MAE-based weighting with graceful demotion, ensemble
//! mean/std-dev with day-1-to-horizon time scaling, and calibration
//! correction against the model-calibration table.

mod engine;
mod ensemble;
mod error;
mod probability;
mod source;
mod sources;
mod weighting;

pub use engine::{probability_for_range, ForecastEngine, ForecastOutput};
pub use ensemble::ConfidenceTier;
pub use error::{ForecastError, ForecastResult};
pub use probability::{model_prob_bucket, probability_with_calibration, ProbabilityResult};
pub use source::{ForecastSource, SourceReading};
pub use sources::{CommercialSource, NwsSource, OpenMeteoSource};
pub use weighting::{build_weights, SourceMae, WeightedSource};
