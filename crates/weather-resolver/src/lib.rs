//! Settles trades once their target date has passed: waits for the
//! platform-authoritative reading in city-local time, determines
//! win/loss by range containment, upserts the canonical market outcome,
//! and rebuilds the calibration tables the scanner and monitor read from.

mod accuracy;
mod calibration;
mod engine;
mod error;
mod outcome;
mod timing;

pub use accuracy::record_trade_accuracy;
pub use calibration::{build_city_error_distribution, build_market_calibration, build_model_calibration};
pub use engine::{MarketResolutionSummary, ResolverEngine};
pub use error::{ResolverError, ResolverResult};
pub use outcome::{contains, settlement_pnl, trade_won, winning_range_label, RangeBound};
pub use timing::is_ready_to_resolve;
