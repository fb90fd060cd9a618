use chrono::{DateTime, Utc};
use weather_platform::Market;
use weather_storage::{MarketCalibrationBucket, Side};

/// Everything the filter chain needs for one (market, side) pair. Built
/// once per cycle by the caller from the market quote, the forecast
/// output, and whatever calibration/observation state is cheap to look up
/// ahead of time.
pub struct ScanCandidate {
    pub market: Market,
    pub side: Side,

    pub platform_trading_disabled: bool,
    pub kalshi_city_blocked: bool,

    pub forecast_mean: f64,
    pub forecast_std_dev: f64,
    pub market_implied_mean: f64,

    pub city_mae: f64,

    pub current_observation_high: Option<f64>,

    pub close_time: DateTime<Utc>,
    pub evaluated_at: DateTime<Utc>,

    pub raw_probability: f64,
    pub corrected_probability: f64,
    pub model_prob_bucket: i32,

    pub market_calibration: Option<MarketCalibrationBucket>,
}

impl ScanCandidate {
    pub fn ask(&self) -> f64 {
        self.market.ask(self.side)
    }

    pub fn bid(&self) -> f64 {
        self.market.bid(self.side)
    }

    pub fn spread(&self) -> f64 {
        self.market.spread(self.side)
    }

    pub fn hours_to_resolution(&self) -> f64 {
        (self.close_time - self.evaluated_at).num_minutes() as f64 / 60.0
    }

    pub fn edge(&self) -> f64 {
        self.corrected_probability - self.ask()
    }

    pub fn lead_time_bucket(&self) -> i32 {
        let hours = self.hours_to_resolution().max(0.0);
        ((hours / 6.0).floor() as i32).clamp(0, 7)
    }

    pub fn price_bucket(&self) -> i32 {
        ((self.ask().clamp(0.0, 1.0) * 10.0).floor() as i32).clamp(0, 9)
    }

    /// Signed distance from the current forecast mean to the edge of the
    /// range nearest it; negative means the forecast is inside the range.
    pub fn distance_to_near_edge(&self) -> f64 {
        match (self.market.range_min, self.market.range_max) {
            (Some(lo), Some(hi)) => {
                if self.forecast_mean < lo {
                    lo - self.forecast_mean
                } else if self.forecast_mean > hi {
                    self.forecast_mean - hi
                } else {
                    -(self.forecast_mean - lo).min(hi - self.forecast_mean)
                }
            }
            (Some(lo), None) => lo - self.forecast_mean,
            (None, Some(hi)) => self.forecast_mean - hi,
            (None, None) => 0.0,
        }
    }

    pub fn distance_to_far_edge(&self) -> Option<f64> {
        match (self.market.range_min, self.market.range_max) {
            (Some(lo), Some(hi)) => {
                if self.forecast_mean < lo {
                    Some(hi - self.forecast_mean)
                } else if self.forecast_mean > hi {
                    Some(self.forecast_mean - lo)
                } else {
                    Some((self.forecast_mean - lo).max(hi - self.forecast_mean))
                }
            }
            _ => None,
        }
    }
}
