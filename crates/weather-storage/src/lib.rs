//! Typed Postgres access for the weather-trading engine. One
//! `StorageGateway` handle per process, cloneable (it wraps a `PgPool`),
//! shared across the scanner, executor, monitor, resolver, and agent
//! state. See `gateway::StorageGateway::init_schema` for the full table
//! set and `rows` for the NUMERIC-to-f64 coercion boundary.

mod calibration;
mod error;
mod gateway;
mod observations;
mod opportunities;
mod resolutions;
mod rows;
mod state;
mod trades;
mod types;
mod views;

pub use calibration::{MarketCalibrationInput, ModelCalibrationInput};
pub use error::{StorageError, StorageResult};
pub use gateway::StorageGateway;
pub use opportunities::NewOpportunity;
pub use trades::NewTrade;
pub use types::*;
