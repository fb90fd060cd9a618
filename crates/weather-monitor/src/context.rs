use chrono::{DateTime, Utc};
use weather_storage::{ExitReason, MarketCalibrationBucket, Trade};

/// Latest ground-truth reading for the trade's (city, target_date).
#[derive(Debug, Clone, Copy)]
pub struct ObservationSnapshot {
    /// max(all sources observed today) -- safe for win detection, never
    /// for loss detection (overshoot across sources yields false exits).
    pub running_high: f64,
    /// max(authoritative source only, observed today).
    pub wu_high: f64,
}

/// Everything one signal evaluator needs for one open trade this cycle.
/// Built fresh every cycle from a live orderbook snapshot, the latest
/// observation, and a freshly recomputed forecast distribution -- the
/// monitor never trusts state cached from a previous cycle.
pub struct MonitorContext<'a> {
    pub trade: &'a Trade,
    pub current_ask: f64,
    pub current_bid: f64,
    pub observation: Option<ObservationSnapshot>,
    pub current_corrected_probability: f64,
    pub market_calibration: Option<&'a MarketCalibrationBucket>,
    pub entry_fee_rate: f64,
    /// True when this trade's platform resolves against exactly one
    /// authoritative source (so `wu_high` already reflects the only
    /// reading that matters); false when multiple sources can each
    /// independently confirm the outcome.
    pub single_source_resolution: bool,
    pub day_is_over: bool,
    pub now: DateTime<Utc>,
}

impl MonitorContext<'_> {
    pub fn is_yes(&self) -> bool {
        self.trade.side == weather_storage::Side::Yes
    }
}

#[derive(Debug, Clone)]
pub struct ExitSignal {
    pub reason: ExitReason,
    pub exit_price: f64,
    pub pnl: f64,
    pub won: bool,
    pub actual_temp: Option<f64>,
}
