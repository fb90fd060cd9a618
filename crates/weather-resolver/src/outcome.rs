use weather_storage::{Side, Trade};

/// A range's bounds, independent of whatever trade or market carries it.
#[derive(Debug, Clone, Copy)]
pub struct RangeBound {
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
}

impl RangeBound {
    pub fn of_trade(trade: &Trade) -> Self {
        Self { range_min: trade.range_min, range_max: trade.range_max }
    }
}

pub fn contains(bound: RangeBound, actual_temp: f64) -> bool {
    match (bound.range_min, bound.range_max) {
        (Some(lo), Some(hi)) => actual_temp >= lo && actual_temp <= hi,
        (Some(lo), None) => actual_temp >= lo,
        (None, Some(hi)) => actual_temp < hi,
        (None, None) => false,
    }
}

/// Pick the label of whichever candidate range contains `actual_temp`, out
/// of every range we ever traded for this market's city/date. `None` when
/// the reading lands outside every range we held a position in.
pub fn winning_range_label(ranges: &[(String, RangeBound)], actual_temp: f64) -> Option<String> {
    ranges.iter().find(|(_, bound)| contains(*bound, actual_temp)).map(|(name, _)| name.clone())
}

pub fn trade_won(trade: &Trade, actual_temp: f64) -> bool {
    let in_range = contains(RangeBound::of_trade(trade), actual_temp);
    match trade.side {
        Side::Yes => in_range,
        Side::No => !in_range,
    }
}

/// Settlement pnl. The entry fee (Kalshi per-contract, zero on
/// Polymarket) was already charged at entry and is never charged again
/// at resolution.
pub fn settlement_pnl(trade: &Trade, won: bool) -> f64 {
    let payout = if won { trade.shares } else { 0.0 };
    payout - trade.cost - trade.entry_fee
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use weather_storage::{EntryReason, Platform, RangeType, TradeStatus};

    fn trade(side: Side, range_min: Option<f64>, range_max: Option<f64>) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            city: "nyc".into(),
            target_date: Utc::now().date_naive(),
            platform: Platform::Polymarket,
            market_id: "m1".into(),
            range_name: "r".into(),
            range_min,
            range_max,
            range_type: if range_min.is_some() && range_max.is_some() {
                RangeType::Bounded
            } else {
                RangeType::Unbounded
            },
            side,
            unit: "F".into(),
            entry_ask: 0.4,
            entry_bid: 0.38,
            entry_spread: 0.02,
            entry_volume: 1000.0,
            forecast_temp: 91.0,
            forecast_confidence: 0.5,
            forecast_std_dev: 1.5,
            ensemble_breakdown: serde_json::json!({}),
            edge: 0.1,
            kelly_fraction: 0.3,
            entry_reason: EntryReason::Edge,
            shares: 100.0,
            cost: 40.0,
            entry_fee: 0.5,
            status: TradeStatus::Open,
            actual_temp: None,
            won: None,
            pnl: None,
            fees: None,
            resolved_at: None,
            resolution_station: None,
            exit_reason: None,
            exit_time: None,
            exit_price: None,
            observation_high: None,
            wu_high: None,
            max_price_seen: None,
            min_probability_seen: None,
            evaluator_log: serde_json::json!([]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn yes_wins_when_temp_falls_inside_bounded_range() {
        let t = trade(Side::Yes, Some(90.0), Some(92.0));
        assert!(trade_won(&t, 91.0));
        assert!(!trade_won(&t, 89.0));
    }

    #[test]
    fn no_wins_when_temp_falls_outside_bounded_range() {
        let t = trade(Side::No, Some(90.0), Some(92.0));
        assert!(!trade_won(&t, 91.0));
        assert!(trade_won(&t, 89.0));
    }

    #[test]
    fn unbounded_upper_range_wins_at_and_above_the_floor() {
        let t = trade(Side::Yes, Some(90.0), None);
        assert!(trade_won(&t, 90.0));
        assert!(!trade_won(&t, 89.9));
    }

    #[test]
    fn settlement_pnl_subtracts_cost_and_entry_fee_on_a_win() {
        let t = trade(Side::Yes, Some(90.0), None);
        let pnl = settlement_pnl(&t, true);
        assert!((pnl - (100.0 - 40.0 - 0.5)).abs() < 1e-9);
    }

    #[test]
    fn settlement_pnl_is_the_full_loss_on_a_loss() {
        let t = trade(Side::Yes, Some(90.0), None);
        let pnl = settlement_pnl(&t, false);
        assert!((pnl - (-40.0 - 0.5)).abs() < 1e-9);
    }

    #[test]
    fn winning_range_label_picks_the_range_that_contains_the_reading() {
        let ranges = vec![
            ("below-32".to_string(), RangeBound { range_min: None, range_max: Some(32.0) }),
            ("32-40".to_string(), RangeBound { range_min: Some(32.0), range_max: Some(40.0) }),
        ];
        assert_eq!(winning_range_label(&ranges, 35.0), Some("32-40".to_string()));
        assert_eq!(winning_range_label(&ranges, 20.0), Some("below-32".to_string()));
        assert_eq!(winning_range_label(&ranges, 50.0), None);
    }
}
