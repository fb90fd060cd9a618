mod candidate;
mod engine;
mod error;
mod filters;

pub use candidate::ScanCandidate;
pub use engine::{
    evaluate_candidate, evaluate_market_both_sides, summarize, EnteredCandidate, ScanSummary,
};
pub use error::{ScannerError, ScannerResult};
pub use filters::{calibration_gate, first_blocking_reason, CalibrationGate};
