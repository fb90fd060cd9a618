use crate::context::{ExitSignal, MonitorContext};
use weather_config::{CalibrationConfig, MonitorConfig};
use weather_storage::ExitReason;

/// One exit rule. Evaluated in priority order by the bus; the first
/// `Some` wins and later signals are never consulted that cycle.
pub trait SignalEvaluator: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(
        &self,
        ctx: &MonitorContext,
        monitor_cfg: &MonitorConfig,
        cal_cfg: &CalibrationConfig,
    ) -> Option<ExitSignal>;
}

/// The authoritative running high has already decided the outcome in the
/// trade's favor, regardless of what the rest of the day brings.
pub struct GuaranteedWin;

impl SignalEvaluator for GuaranteedWin {
    fn name(&self) -> &'static str {
        "guaranteed_win"
    }

    fn evaluate(&self, ctx: &MonitorContext, _monitor_cfg: &MonitorConfig, _cal_cfg: &CalibrationConfig) -> Option<ExitSignal> {
        let obs = ctx.observation?;
        // max(sources) is safe here: overshoot only ever helps win detection.
        let high =
            if ctx.single_source_resolution { obs.wu_high } else { obs.running_high.max(obs.wu_high) };

        let high_locked_in_range = match (ctx.trade.range_min, ctx.trade.range_max) {
            (Some(lo), None) => high >= lo,
            (None, Some(hi)) => ctx.day_is_over && high < hi,
            (Some(lo), Some(hi)) => ctx.day_is_over && high >= lo && high <= hi,
            (None, None) => false,
        };

        let won = if ctx.is_yes() { high_locked_in_range } else { !high_locked_in_range && ctx.day_is_over };
        if !won {
            return None;
        }

        Some(ExitSignal {
            reason: ExitReason::GuaranteedWin,
            exit_price: 1.0,
            pnl: (1.0 - ctx.trade.entry_ask) * ctx.trade.shares - ctx.trade.entry_fee,
            won: true,
            actual_temp: Some(high),
        })
    }
}

/// The authoritative source has definitively excluded the range. Uses
/// `wu_high` only on the "exceeded" check -- `running_high` can overshoot
/// across sources and would otherwise produce a false exit.
pub struct GuaranteedLoss;

impl SignalEvaluator for GuaranteedLoss {
    fn name(&self) -> &'static str {
        "guaranteed_loss"
    }

    fn evaluate(&self, ctx: &MonitorContext, _monitor_cfg: &MonitorConfig, _cal_cfg: &CalibrationConfig) -> Option<ExitSignal> {
        let obs = ctx.observation?;

        let range_excluded = match (ctx.trade.range_min, ctx.trade.range_max) {
            (Some(lo), None) => ctx.day_is_over && obs.wu_high < lo,
            (None, Some(hi)) => obs.wu_high > hi,
            (Some(lo), Some(hi)) => obs.wu_high > hi || (ctx.day_is_over && obs.wu_high < lo),
            (None, None) => false,
        };

        let lost = if ctx.is_yes() { range_excluded } else { !range_excluded && ctx.day_is_over };
        if !lost {
            return None;
        }

        Some(ExitSignal {
            reason: ExitReason::GuaranteedLoss,
            exit_price: 0.0,
            pnl: -ctx.trade.entry_ask * ctx.trade.shares - ctx.trade.entry_fee,
            won: false,
            actual_temp: Some(obs.wu_high),
        })
    }
}

/// Tier-based take-profit: longshots exit at a higher absolute bid than
/// favorites do, because the remaining upside on a longshot compresses
/// fast once the market starts agreeing with the trade. A profitability
/// guard blocks exits that would lose money to fees near entry.
pub struct TakeProfit;

impl SignalEvaluator for TakeProfit {
    fn name(&self) -> &'static str {
        "take_profit"
    }

    fn evaluate(&self, ctx: &MonitorContext, monitor_cfg: &MonitorConfig, _cal_cfg: &CalibrationConfig) -> Option<ExitSignal> {
        let threshold = if ctx.trade.entry_ask <= monitor_cfg.take_profit_longshot_ask_max {
            monitor_cfg.take_profit_longshot_bid_threshold
        } else if ctx.trade.entry_ask <= monitor_cfg.take_profit_mid_ask_max {
            monitor_cfg.take_profit_mid_bid_threshold
        } else {
            monitor_cfg.take_profit_favorite_bid_threshold
        };

        if ctx.current_bid < threshold {
            return None;
        }

        let net_bid = ctx.current_bid * (1.0 - ctx.entry_fee_rate);
        if net_bid <= ctx.trade.entry_ask {
            return None;
        }

        let pnl = (ctx.current_bid - ctx.trade.entry_ask) * ctx.trade.shares - ctx.trade.entry_fee;
        Some(ExitSignal {
            reason: ExitReason::TakeProfit,
            exit_price: ctx.current_bid,
            pnl,
            won: true,
            actual_temp: None,
        })
    }
}

/// Exits a trade once the freshly recomputed model probability has
/// fallen materially below what it was at entry. Suppressed when the
/// trade's market-calibration bucket has already vouched for this edge
/// (the same `edge_bypass` predicate the scanner uses to skip
/// `max_model_market_ratio`).
pub struct EdgeGone;

impl SignalEvaluator for EdgeGone {
    fn name(&self) -> &'static str {
        "edge_gone"
    }

    fn evaluate(&self, ctx: &MonitorContext, monitor_cfg: &MonitorConfig, cal_cfg: &CalibrationConfig) -> Option<ExitSignal> {
        if let Some(bucket) = ctx.market_calibration {
            if weather_numerics::edge_bypass(bucket.n, bucket.true_edge, cal_cfg.cal_confirms_min_n) {
                return None;
            }
        }

        let decay = ctx.trade.forecast_confidence - ctx.current_corrected_probability;
        if decay < monitor_cfg.edge_gone_threshold {
            return None;
        }

        let pnl = (ctx.current_bid - ctx.trade.entry_ask) * ctx.trade.shares - ctx.trade.entry_fee;
        Some(ExitSignal {
            reason: ExitReason::EdgeGone,
            exit_price: ctx.current_bid,
            pnl,
            won: pnl > 0.0,
            actual_temp: None,
        })
    }
}

/// Default signal bus in spec.md §4.6's priority order.
pub fn default_signal_bus() -> Vec<Box<dyn SignalEvaluator>> {
    vec![Box::new(GuaranteedWin), Box::new(GuaranteedLoss), Box::new(TakeProfit), Box::new(EdgeGone)]
}

/// Run every signal in priority order and return the first that fires.
pub fn evaluate_signals(
    bus: &[Box<dyn SignalEvaluator>],
    ctx: &MonitorContext,
    monitor_cfg: &MonitorConfig,
    cal_cfg: &CalibrationConfig,
) -> Option<(&'static str, ExitSignal)> {
    for signal in bus {
        if let Some(exit) = signal.evaluate(ctx, monitor_cfg, cal_cfg) {
            return Some((signal.name(), exit));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ObservationSnapshot;
    use chrono::Utc;
    use uuid::Uuid;
    use weather_storage::{EntryReason, Platform, RangeType, Side, TradeStatus};

    fn base_trade() -> weather_storage::Trade {
        weather_storage::Trade {
            id: Uuid::new_v4(),
            city: "nyc".into(),
            target_date: Utc::now().date_naive(),
            platform: Platform::Polymarket,
            market_id: "m1".into(),
            range_name: "above-90".into(),
            range_min: Some(90.0),
            range_max: None,
            range_type: RangeType::Unbounded,
            side: Side::Yes,
            unit: "F".into(),
            entry_ask: 0.3,
            entry_bid: 0.28,
            entry_spread: 0.02,
            entry_volume: 1000.0,
            forecast_temp: 91.0,
            forecast_confidence: 0.45,
            forecast_std_dev: 1.5,
            ensemble_breakdown: serde_json::json!({}),
            edge: 0.15,
            kelly_fraction: 0.5,
            entry_reason: EntryReason::Edge,
            shares: 100.0,
            cost: 30.0,
            entry_fee: 0.0,
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

    fn base_ctx(trade: &weather_storage::Trade) -> MonitorContext<'_> {
        MonitorContext {
            trade,
            current_ask: 0.3,
            current_bid: 0.28,
            observation: Some(ObservationSnapshot { running_high: 88.0, wu_high: 88.0 }),
            current_corrected_probability: 0.45,
            market_calibration: None,
            entry_fee_rate: 0.0,
            single_source_resolution: true,
            day_is_over: false,
            now: Utc::now(),
        }
    }

    #[test]
    fn guaranteed_win_fires_once_unbounded_lower_threshold_is_crossed() {
        let trade = base_trade();
        let mut ctx = base_ctx(&trade);
        ctx.observation = Some(ObservationSnapshot { running_high: 91.0, wu_high: 91.0 });
        let monitor_cfg = MonitorConfig::default();
        let cal_cfg = CalibrationConfig::default();
        let result = GuaranteedWin.evaluate(&ctx, &monitor_cfg, &cal_cfg);
        assert!(result.is_some());
        assert!(result.unwrap().won);
    }

    #[test]
    fn guaranteed_win_does_not_fire_below_threshold() {
        let trade = base_trade();
        let ctx = base_ctx(&trade);
        let monitor_cfg = MonitorConfig::default();
        let cal_cfg = CalibrationConfig::default();
        assert!(GuaranteedWin.evaluate(&ctx, &monitor_cfg, &cal_cfg).is_none());
    }

    #[test]
    fn guaranteed_loss_uses_wu_high_only_never_running_high_alone() {
        let trade = base_trade();
        let mut ctx = base_ctx(&trade);
        // running_high overshoots past the threshold due to a bad source,
        // but wu_high (the authoritative reading) hasn't -- must not fire.
        ctx.observation = Some(ObservationSnapshot { running_high: 95.0, wu_high: 88.0 });
        ctx.day_is_over = true;
        let monitor_cfg = MonitorConfig::default();
        let cal_cfg = CalibrationConfig::default();
        assert!(GuaranteedLoss.evaluate(&ctx, &monitor_cfg, &cal_cfg).is_none());
    }

    #[test]
    fn take_profit_blocked_by_profitability_guard_near_entry() {
        let mut trade = base_trade();
        trade.entry_ask = 0.80; // favorite tier, threshold 0.95
        let mut ctx = base_ctx(&trade);
        ctx.current_bid = 0.95;
        ctx.entry_fee_rate = 0.2; // net bid = 0.76 < entry_ask 0.80
        let monitor_cfg = MonitorConfig::default();
        let cal_cfg = CalibrationConfig::default();
        assert!(TakeProfit.evaluate(&ctx, &monitor_cfg, &cal_cfg).is_none());
    }

    #[test]
    fn take_profit_fires_when_threshold_and_guard_both_clear() {
        let mut trade = base_trade();
        trade.entry_ask = 0.10; // longshot tier, threshold 0.85
        let mut ctx = base_ctx(&trade);
        ctx.current_bid = 0.90;
        let monitor_cfg = MonitorConfig::default();
        let cal_cfg = CalibrationConfig::default();
        assert!(TakeProfit.evaluate(&ctx, &monitor_cfg, &cal_cfg).is_some());
    }

    #[test]
    fn edge_gone_suppressed_when_calibration_bucket_confirms() {
        let trade = base_trade();
        let mut ctx = base_ctx(&trade);
        ctx.current_corrected_probability = 0.05; // large decay from 0.45
        let bucket = weather_storage::MarketCalibrationBucket {
            platform: Platform::Polymarket,
            range_type: RangeType::Unbounded,
            lead_time_bucket: 1,
            price_bucket: 3,
            n: 100,
            empirical_win_rate: 0.5,
            market_avg_ask: 0.3,
            true_edge: 0.2,
        };
        ctx.market_calibration = Some(&bucket);
        let monitor_cfg = MonitorConfig::default();
        let cal_cfg = CalibrationConfig::default();
        assert!(EdgeGone.evaluate(&ctx, &monitor_cfg, &cal_cfg).is_none());
    }

    #[test]
    fn edge_gone_fires_when_decay_exceeds_threshold_and_no_calibration() {
        let trade = base_trade();
        let mut ctx = base_ctx(&trade);
        ctx.current_corrected_probability = 0.05;
        let monitor_cfg = MonitorConfig::default();
        let cal_cfg = CalibrationConfig::default();
        assert!(EdgeGone.evaluate(&ctx, &monitor_cfg, &cal_cfg).is_some());
    }
}
