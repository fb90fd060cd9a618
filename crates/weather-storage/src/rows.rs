//! Raw-row structs bound directly to `sqlx::FromRow`, and the `From<Row>`
//! conversions that coerce `NUMERIC` columns to `f64` at this single
//! boundary. Skipping this conversion and doing arithmetic directly on
//! driver-native decimal/string types is the documented failure mode that
//! silently turns addition into string concatenation and produces NaN
//! bankrolls downstream (spec.md §4.1, §7).

use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn opt_dec_to_f64(d: Option<Decimal>) -> Option<f64> {
    d.map(dec_to_f64)
}

#[derive(Debug, sqlx::FromRow)]
pub struct TradeRow {
    pub id: Uuid,
    pub city: String,
    pub target_date: NaiveDate,
    pub platform: String,
    pub market_id: String,
    pub range_name: String,
    pub range_min: Option<Decimal>,
    pub range_max: Option<Decimal>,
    pub range_type: String,
    pub side: String,
    pub unit: String,
    pub entry_ask: Decimal,
    pub entry_bid: Decimal,
    pub entry_spread: Decimal,
    pub entry_volume: Decimal,
    pub forecast_temp: Decimal,
    pub forecast_confidence: Decimal,
    pub forecast_std_dev: Decimal,
    pub ensemble_breakdown: serde_json::Value,
    pub edge: Decimal,
    pub kelly_fraction: Decimal,
    pub entry_reason: String,
    pub shares: Decimal,
    pub cost: Decimal,
    pub entry_fee: Decimal,
    pub status: String,
    pub actual_temp: Option<Decimal>,
    pub won: Option<bool>,
    pub pnl: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_station: Option<String>,
    pub exit_reason: Option<String>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<Decimal>,
    pub observation_high: Option<Decimal>,
    pub wu_high: Option<Decimal>,
    pub max_price_seen: Option<Decimal>,
    pub min_probability_seen: Option<Decimal>,
    pub evaluator_log: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

fn parse_platform(s: &str) -> Platform {
    match s {
        "kalshi" => Platform::Kalshi,
        _ => Platform::Polymarket,
    }
}

fn parse_range_type(s: &str) -> RangeType {
    match s {
        "unbounded" => RangeType::Unbounded,
        _ => RangeType::Bounded,
    }
}

fn parse_side(s: &str) -> Side {
    match s {
        "no" => Side::No,
        _ => Side::Yes,
    }
}

fn parse_status(s: &str) -> TradeStatus {
    match s {
        "resolved" => TradeStatus::Resolved,
        "exited" => TradeStatus::Exited,
        _ => TradeStatus::Open,
    }
}

fn parse_entry_reason(s: &str) -> EntryReason {
    match s {
        "guaranteed_win" => EntryReason::GuaranteedWin,
        "guaranteed_win_pws" => EntryReason::GuaranteedWinPws,
        _ => EntryReason::Edge,
    }
}

fn parse_exit_reason(s: &str) -> ExitReason {
    match s {
        "guaranteed_loss" => ExitReason::GuaranteedLoss,
        "take_profit" => ExitReason::TakeProfit,
        "edge_gone" => ExitReason::EdgeGone,
        _ => ExitReason::GuaranteedWin,
    }
}

impl From<TradeRow> for Trade {
    fn from(r: TradeRow) -> Self {
        Trade {
            id: r.id,
            city: r.city,
            target_date: r.target_date,
            platform: parse_platform(&r.platform),
            market_id: r.market_id,
            range_name: r.range_name,
            range_min: opt_dec_to_f64(r.range_min),
            range_max: opt_dec_to_f64(r.range_max),
            range_type: parse_range_type(&r.range_type),
            side: parse_side(&r.side),
            unit: r.unit,
            entry_ask: dec_to_f64(r.entry_ask),
            entry_bid: dec_to_f64(r.entry_bid),
            entry_spread: dec_to_f64(r.entry_spread),
            entry_volume: dec_to_f64(r.entry_volume),
            forecast_temp: dec_to_f64(r.forecast_temp),
            forecast_confidence: dec_to_f64(r.forecast_confidence),
            forecast_std_dev: dec_to_f64(r.forecast_std_dev),
            ensemble_breakdown: r.ensemble_breakdown,
            edge: dec_to_f64(r.edge),
            kelly_fraction: dec_to_f64(r.kelly_fraction),
            entry_reason: parse_entry_reason(&r.entry_reason),
            shares: dec_to_f64(r.shares),
            cost: dec_to_f64(r.cost),
            entry_fee: dec_to_f64(r.entry_fee),
            status: parse_status(&r.status),
            actual_temp: opt_dec_to_f64(r.actual_temp),
            won: r.won,
            pnl: opt_dec_to_f64(r.pnl),
            fees: opt_dec_to_f64(r.fees),
            resolved_at: r.resolved_at,
            resolution_station: r.resolution_station,
            exit_reason: r.exit_reason.as_deref().map(parse_exit_reason),
            exit_time: r.exit_time,
            exit_price: opt_dec_to_f64(r.exit_price),
            observation_high: opt_dec_to_f64(r.observation_high),
            wu_high: opt_dec_to_f64(r.wu_high),
            max_price_seen: opt_dec_to_f64(r.max_price_seen),
            min_probability_seen: opt_dec_to_f64(r.min_probability_seen),
            evaluator_log: r.evaluator_log,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OpportunityRow {
    pub id: Uuid,
    pub city: String,
    pub target_date: NaiveDate,
    pub platform: String,
    pub market_id: String,
    pub range_name: String,
    pub range_min: Option<Decimal>,
    pub range_max: Option<Decimal>,
    pub range_type: String,
    pub side: String,
    pub ask: Decimal,
    pub bid: Decimal,
    pub spread: Decimal,
    pub volume: Decimal,
    pub forecast_temp: Decimal,
    pub ensemble_std_dev: Decimal,
    pub source_disagreement: Decimal,
    pub market_implied_mean: Decimal,
    pub market_divergence: Decimal,
    pub distance_to_near_edge: Decimal,
    pub distance_to_far_edge: Option<Decimal>,
    pub kelly_fraction: Decimal,
    pub raw_probability: Decimal,
    pub corrected_probability: Decimal,
    pub edge: Decimal,
    pub model_prob_bucket: i32,
    pub lead_time_bucket: i32,
    pub price_bucket: i32,
    pub filter_reason: Option<String>,
    pub action: String,
    pub actual_temp: Option<Decimal>,
    pub would_have_won: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl From<OpportunityRow> for Opportunity {
    fn from(r: OpportunityRow) -> Self {
        Opportunity {
            id: r.id,
            city: r.city,
            target_date: r.target_date,
            platform: parse_platform(&r.platform),
            market_id: r.market_id,
            range_name: r.range_name,
            range_min: opt_dec_to_f64(r.range_min),
            range_max: opt_dec_to_f64(r.range_max),
            range_type: parse_range_type(&r.range_type),
            side: parse_side(&r.side),
            ask: dec_to_f64(r.ask),
            bid: dec_to_f64(r.bid),
            spread: dec_to_f64(r.spread),
            volume: dec_to_f64(r.volume),
            forecast_temp: dec_to_f64(r.forecast_temp),
            ensemble_std_dev: dec_to_f64(r.ensemble_std_dev),
            source_disagreement: dec_to_f64(r.source_disagreement),
            market_implied_mean: dec_to_f64(r.market_implied_mean),
            market_divergence: dec_to_f64(r.market_divergence),
            distance_to_near_edge: dec_to_f64(r.distance_to_near_edge),
            distance_to_far_edge: opt_dec_to_f64(r.distance_to_far_edge),
            kelly_fraction: dec_to_f64(r.kelly_fraction),
            raw_probability: dec_to_f64(r.raw_probability),
            corrected_probability: dec_to_f64(r.corrected_probability),
            edge: dec_to_f64(r.edge),
            model_prob_bucket: r.model_prob_bucket,
            lead_time_bucket: r.lead_time_bucket,
            price_bucket: r.price_bucket,
            filter_reason: r.filter_reason,
            action: r.action,
            actual_temp: opt_dec_to_f64(r.actual_temp),
            would_have_won: r.would_have_won,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ObservationRow {
    pub id: Uuid,
    pub city: String,
    pub target_date: NaiveDate,
    pub observed_at: DateTime<Utc>,
    pub station_id: String,
    pub temp: Decimal,
    pub running_high: Decimal,
    pub wu_high: Decimal,
    pub observation_count: i64,
}

impl From<ObservationRow> for Observation {
    fn from(r: ObservationRow) -> Self {
        Observation {
            id: r.id,
            city: r.city,
            target_date: r.target_date,
            observed_at: r.observed_at,
            station_id: r.station_id,
            temp: dec_to_f64(r.temp),
            running_high: dec_to_f64(r.running_high),
            wu_high: dec_to_f64(r.wu_high),
            observation_count: r.observation_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MarketResolutionRow {
    pub market_id: String,
    pub platform: String,
    pub actual_temp: Decimal,
    pub winning_range: String,
    pub resolved_at: DateTime<Utc>,
    pub resolution_station: String,
}

impl From<MarketResolutionRow> for MarketResolution {
    fn from(r: MarketResolutionRow) -> Self {
        MarketResolution {
            market_id: r.market_id,
            platform: parse_platform(&r.platform),
            actual_temp: dec_to_f64(r.actual_temp),
            winning_range: r.winning_range,
            resolved_at: r.resolved_at,
            resolution_station: r.resolution_station,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ModelCalibrationRow {
    pub range_type: String,
    pub model_prob_bucket: i32,
    pub n: i64,
    pub avg_model_prob: Decimal,
    pub actual_win_rate: Decimal,
    pub correction_ratio: Decimal,
}

impl From<ModelCalibrationRow> for ModelCalibrationBucket {
    fn from(r: ModelCalibrationRow) -> Self {
        ModelCalibrationBucket {
            range_type: parse_range_type(&r.range_type),
            model_prob_bucket: r.model_prob_bucket,
            n: r.n,
            avg_model_prob: dec_to_f64(r.avg_model_prob),
            actual_win_rate: dec_to_f64(r.actual_win_rate),
            correction_ratio: dec_to_f64(r.correction_ratio),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MarketCalibrationRow {
    pub platform: String,
    pub range_type: String,
    pub lead_time_bucket: i32,
    pub price_bucket: i32,
    pub n: i64,
    pub empirical_win_rate: Decimal,
    pub market_avg_ask: Decimal,
    pub true_edge: Decimal,
}

impl From<MarketCalibrationRow> for MarketCalibrationBucket {
    fn from(r: MarketCalibrationRow) -> Self {
        MarketCalibrationBucket {
            platform: parse_platform(&r.platform),
            range_type: parse_range_type(&r.range_type),
            lead_time_bucket: r.lead_time_bucket,
            price_bucket: r.price_bucket,
            n: r.n,
            empirical_win_rate: dec_to_f64(r.empirical_win_rate),
            market_avg_ask: dec_to_f64(r.market_avg_ask),
            true_edge: dec_to_f64(r.true_edge),
        }
    }
}
