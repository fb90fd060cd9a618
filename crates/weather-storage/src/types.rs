use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Platform {
    Polymarket,
    Kalshi,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Polymarket => "polymarket",
            Platform::Kalshi => "kalshi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum RangeType {
    Bounded,
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum TradeStatus {
    #[sqlx(rename = "open")]
    Open,
    #[sqlx(rename = "resolved")]
    Resolved,
    #[sqlx(rename = "exited")]
    Exited,
}

/// Provenance of a trade, carried through to calibration honesty checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum EntryReason {
    #[sqlx(rename = "edge")]
    Edge,
    #[sqlx(rename = "guaranteed_win")]
    GuaranteedWin,
    #[sqlx(rename = "guaranteed_win_pws")]
    GuaranteedWinPws,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum ExitReason {
    #[sqlx(rename = "guaranteed_win")]
    GuaranteedWin,
    #[sqlx(rename = "guaranteed_loss")]
    GuaranteedLoss,
    #[sqlx(rename = "take_profit")]
    TakeProfit,
    #[sqlx(rename = "edge_gone")]
    EdgeGone,
}

/// One position taken by the engine. See spec.md §3 for the full invariant
/// list (cost == shares*entry_ask, resolved/exited field population, etc).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub city: String,
    pub target_date: NaiveDate,
    pub platform: Platform,
    pub market_id: String,
    pub range_name: String,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub range_type: RangeType,
    pub side: Side,
    pub unit: String,

    // Entry snapshot
    pub entry_ask: f64,
    pub entry_bid: f64,
    pub entry_spread: f64,
    pub entry_volume: f64,
    pub forecast_temp: f64,
    pub forecast_confidence: f64,
    pub forecast_std_dev: f64,
    pub ensemble_breakdown: serde_json::Value,
    pub edge: f64,
    pub kelly_fraction: f64,
    pub entry_reason: EntryReason,

    // Position
    pub shares: f64,
    pub cost: f64,
    pub entry_fee: f64,

    pub status: TradeStatus,

    // Resolution
    pub actual_temp: Option<f64>,
    pub won: Option<bool>,
    pub pnl: Option<f64>,
    pub fees: Option<f64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_station: Option<String>,

    // Exit
    pub exit_reason: Option<ExitReason>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,

    // Observation audit -- preserved verbatim once set, never overwritten
    // by a later resolution pass.
    pub observation_high: Option<f64>,
    pub wu_high: Option<f64>,

    // Running extremes
    pub max_price_seen: Option<f64>,
    pub min_probability_seen: Option<f64>,

    /// Trimmed monitor evaluator log, capped at N entries by the monitor.
    pub evaluator_log: serde_json::Value,

    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// Invariant 1: cost must equal shares * entry_ask.
    pub fn cost_matches_shares(&self) -> bool {
        (self.cost - self.shares * self.entry_ask).abs() < 1e-6
    }
}

/// One row per (range, side, cycle) evaluated by the scanner. Append-only;
/// the resolver backfills outcome columns once the market resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub city: String,
    pub target_date: NaiveDate,
    pub platform: Platform,
    pub market_id: String,
    pub range_name: String,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub range_type: RangeType,
    pub side: Side,

    pub ask: f64,
    pub bid: f64,
    pub spread: f64,
    pub volume: f64,

    pub forecast_temp: f64,
    pub ensemble_std_dev: f64,
    pub source_disagreement: f64,
    pub market_implied_mean: f64,
    pub market_divergence: f64,

    pub distance_to_near_edge: f64,
    pub distance_to_far_edge: Option<f64>,

    pub kelly_fraction: f64,
    pub raw_probability: f64,
    pub corrected_probability: f64,
    pub edge: f64,

    pub model_prob_bucket: i32,
    pub lead_time_bucket: i32,
    pub price_bucket: i32,

    /// Null when the candidate entered (`action = "entered"`).
    pub filter_reason: Option<String>,
    pub action: String,

    // Backfilled by resolver once the market settles.
    pub actual_temp: Option<f64>,
    pub would_have_won: Option<bool>,

    pub created_at: DateTime<Utc>,
}

/// Canonical market_id -> outcome mapping. Unique per market id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResolution {
    pub market_id: String,
    pub platform: Platform,
    pub actual_temp: f64,
    pub winning_range: String,
    pub resolved_at: DateTime<Utc>,
    pub resolution_station: String,
}

/// Per (city, target_date, observed_at) ground-truth reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub city: String,
    pub target_date: NaiveDate,
    pub observed_at: DateTime<Utc>,
    pub station_id: String,
    pub temp: f64,
    /// max(all sources observed today).
    pub running_high: f64,
    /// max(authoritative source only, observed today).
    pub wu_high: f64,
    pub observation_count: i64,
}

/// Model-calibration bucket: keyed by (range_type, model_prob_bucket).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCalibrationBucket {
    pub range_type: RangeType,
    pub model_prob_bucket: i32,
    pub n: i64,
    pub avg_model_prob: f64,
    pub actual_win_rate: f64,
    pub correction_ratio: f64,
}

/// Market-calibration bucket: keyed by (platform, range_type,
/// lead_time_bucket, price_bucket). Used only to suppress monitor exits on
/// calibration-confirmed trades and to gate/bypass scanner filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCalibrationBucket {
    pub platform: Platform,
    pub range_type: RangeType,
    pub lead_time_bucket: i32,
    pub price_bucket: i32,
    pub n: i64,
    pub empirical_win_rate: f64,
    pub market_avg_ask: f64,
    pub true_edge: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityErrorDistribution {
    pub city: String,
    pub n: i64,
    pub mean_error: f64,
    pub std_dev_error: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvRefreshLogEntry {
    pub view_name: String,
    pub refreshed_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub row_count: i64,
}
