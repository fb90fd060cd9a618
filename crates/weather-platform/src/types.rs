use chrono::NaiveDate;
use weather_storage::{Platform, RangeType, Side};

/// A raw temperature range tradeable on one market, one leg per side.
#[derive(Debug, Clone)]
pub struct Market {
    pub platform: Platform,
    pub market_id: String,
    pub city: String,
    pub target_date: NaiveDate,
    pub range_name: String,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub range_type: RangeType,
    pub yes_ask: f64,
    pub yes_bid: f64,
    pub no_ask: f64,
    pub no_bid: f64,
    pub volume: f64,
}

impl Market {
    pub fn ask(&self, side: Side) -> f64 {
        match side {
            Side::Yes => self.yes_ask,
            Side::No => self.no_ask,
        }
    }

    pub fn bid(&self, side: Side) -> f64 {
        match side {
            Side::Yes => self.yes_bid,
            Side::No => self.no_bid,
        }
    }

    pub fn spread(&self, side: Side) -> f64 {
        self.ask(side) - self.bid(side)
    }
}

/// Parsed shape of a range label, pre continuity-correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range_type: RangeType,
}
