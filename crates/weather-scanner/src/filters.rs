use crate::candidate::ScanCandidate;
use weather_config::{CalibrationConfig, FilterConfig, ForecastSourceConfig};
use weather_storage::{RangeType, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationGate {
    /// No market-calibration bucket with enough samples either way.
    Neutral,
    /// calBlocksEdge: negative true_edge at high confidence -- block.
    Blocks,
    /// calConfirmsEdge: lets the candidate through `max_model_market_ratio`
    /// and later suppresses the monitor's edge_gone exit for this trade.
    Confirms,
}

pub fn calibration_gate(candidate: &ScanCandidate, cfg: &CalibrationConfig) -> CalibrationGate {
    let Some(bucket) = &candidate.market_calibration else {
        return CalibrationGate::Neutral;
    };
    if weather_numerics::edge_bypass(bucket.n, bucket.true_edge, cfg.cal_confirms_min_n)
        && bucket.empirical_win_rate - candidate.ask() >= 0.03
        && candidate.raw_probability - candidate.ask() >= cfg.cal_min_trade_edge
    {
        return CalibrationGate::Confirms;
    }
    if bucket.n >= cfg.cal_blocks_min_n && bucket.true_edge < 0.0 {
        return CalibrationGate::Blocks;
    }
    CalibrationGate::Neutral
}

/// The ordered filter chain. Returns the first filter reason that fires,
/// or `None` if the candidate clears every gate and should enter. Every
/// check here is pure and side-effect free so the scanner can run it once
/// per side per market per cycle without any shared mutable state.
pub fn first_blocking_reason(
    candidate: &ScanCandidate,
    filter_cfg: &FilterConfig,
    cal_cfg: &CalibrationConfig,
    source_cfg: &ForecastSourceConfig,
    gate: CalibrationGate,
) -> Option<&'static str> {
    if candidate.platform_trading_disabled {
        return Some("platform_trading_disabled");
    }
    if candidate.kalshi_city_blocked {
        return Some("kalshi_city_blocked");
    }

    let ask = candidate.ask();
    if ask <= 0.0 || ask >= 1.0 {
        return Some("ghost_market");
    }
    match candidate.side {
        Side::Yes => {
            if ask < filter_cfg.min_ask_yes {
                return Some("no_ask_floor");
            }
        }
        Side::No => {
            if ask < filter_cfg.min_ask_no {
                return Some("no_ask_floor");
            }
            if ask > filter_cfg.max_ask_no {
                return Some("no_ask_cap");
            }
        }
    }

    if candidate.hours_to_resolution() < filter_cfg.min_hours_to_resolution {
        return Some("min_hours");
    }

    if candidate.city_mae > city_mae_ceiling(candidate, source_cfg) {
        return Some("city_mae_gate");
    }

    let spread = candidate.spread();
    if spread > filter_cfg.max_spread {
        return Some("high_spread");
    }
    if ask > 0.0 && spread / ask > filter_cfg.max_spread_pct {
        return Some("spread_pct");
    }

    if candidate.market.range_type == RangeType::Bounded && candidate.side == Side::Yes {
        if let (Some(lo), Some(hi)) = (candidate.market.range_min, candidate.market.range_max) {
            let width = (hi - lo).max(1e-9);
            if candidate.forecast_std_dev / width > filter_cfg.max_std_range_ratio {
                return Some("high_std_range_ratio");
            }
        }
    }

    if gate != CalibrationGate::Confirms
        && candidate.raw_probability > filter_cfg.max_model_market_ratio * ask.max(1e-9)
    {
        return Some("max_model_market_ratio");
    }

    if (candidate.forecast_mean - candidate.market_implied_mean).abs() > filter_cfg.max_market_divergence {
        return Some("market_divergence");
    }

    if let Some(observed) = candidate.current_observation_high {
        if let Some(hi) = candidate.market.range_max {
            if candidate.side == Side::Yes && (hi - observed).abs() < 0.3 {
                return Some("observation_boundary");
            }
        }
    }

    if gate == CalibrationGate::Blocks {
        return Some("calBlocksEdge");
    }

    if candidate.edge() < filter_cfg.min_edge_pct {
        return Some("low_edge");
    }

    None
}

fn city_mae_ceiling(candidate: &ScanCandidate, cfg: &ForecastSourceConfig) -> f64 {
    match candidate.market.range_type {
        RangeType::Bounded => cfg.city_mae_ceiling_bounded_f,
        RangeType::Unbounded => cfg.city_mae_ceiling_unbounded_f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use weather_platform::Market;
    use weather_storage::{Platform, RangeType as RT};

    fn base_market() -> Market {
        Market {
            platform: Platform::Polymarket,
            market_id: "m1".into(),
            city: "nyc".into(),
            target_date: Utc::now().date_naive(),
            range_name: "34-35".into(),
            range_min: Some(33.5),
            range_max: Some(35.5),
            range_type: RT::Bounded,
            yes_ask: 0.4,
            yes_bid: 0.35,
            no_ask: 0.6,
            no_bid: 0.55,
            volume: 1000.0,
        }
    }

    fn base_candidate() -> ScanCandidate {
        ScanCandidate {
            market: base_market(),
            side: Side::Yes,
            platform_trading_disabled: false,
            kalshi_city_blocked: false,
            forecast_mean: 34.5,
            forecast_std_dev: 1.0,
            market_implied_mean: 34.5,
            city_mae: 1.0,
            current_observation_high: None,
            close_time: Utc::now() + Duration::hours(10),
            evaluated_at: Utc::now(),
            raw_probability: 0.5,
            corrected_probability: 0.5,
            model_prob_bucket: 5,
            market_calibration: None,
        }
    }

    #[test]
    fn clean_candidate_clears_every_gate_when_edge_is_sufficient() {
        let mut c = base_candidate();
        c.corrected_probability = 0.6;
        let cfg = FilterConfig::default();
        let cal_cfg = CalibrationConfig::default();
        let source_cfg = weather_config::ForecastSourceConfig::default();
        let gate = calibration_gate(&c, &cal_cfg);
        assert_eq!(first_blocking_reason(&c, &cfg, &cal_cfg, &source_cfg, gate), None);
    }

    #[test]
    fn disabled_platform_blocks_first() {
        let mut c = base_candidate();
        c.platform_trading_disabled = true;
        c.kalshi_city_blocked = true;
        let cfg = FilterConfig::default();
        let cal_cfg = CalibrationConfig::default();
        let source_cfg = weather_config::ForecastSourceConfig::default();
        let gate = calibration_gate(&c, &cal_cfg);
        assert_eq!(
            first_blocking_reason(&c, &cfg, &cal_cfg, &source_cfg, gate),
            Some("platform_trading_disabled")
        );
    }

    #[test]
    fn low_edge_fires_when_probability_barely_beats_ask() {
        let mut c = base_candidate();
        c.corrected_probability = c.ask() + 0.01;
        let cfg = FilterConfig::default();
        let cal_cfg = CalibrationConfig::default();
        let source_cfg = weather_config::ForecastSourceConfig::default();
        let gate = calibration_gate(&c, &cal_cfg);
        assert_eq!(first_blocking_reason(&c, &cfg, &cal_cfg, &source_cfg, gate), Some("low_edge"));
    }

    #[test]
    fn calibration_confirms_bypasses_max_model_market_ratio() {
        use weather_storage::MarketCalibrationBucket;
        let mut c = base_candidate();
        c.raw_probability = 0.99;
        c.corrected_probability = 0.99;
        c.market_calibration = Some(MarketCalibrationBucket {
            platform: Platform::Polymarket,
            range_type: RT::Bounded,
            lead_time_bucket: 1,
            price_bucket: 4,
            n: 100,
            empirical_win_rate: 0.9,
            market_avg_ask: 0.4,
            true_edge: 0.5,
        });
        let cfg = FilterConfig::default();
        let cal_cfg = CalibrationConfig::default();
        let source_cfg = weather_config::ForecastSourceConfig::default();
        let gate = calibration_gate(&c, &cal_cfg);
        assert_eq!(gate, CalibrationGate::Confirms);
        assert_eq!(first_blocking_reason(&c, &cfg, &cal_cfg, &source_cfg, gate), None);
    }

    #[test]
    fn calibration_blocks_even_positive_edge() {
        use weather_storage::MarketCalibrationBucket;
        let mut c = base_candidate();
        c.corrected_probability = 0.6;
        c.market_calibration = Some(MarketCalibrationBucket {
            platform: Platform::Polymarket,
            range_type: RT::Bounded,
            lead_time_bucket: 1,
            price_bucket: 4,
            n: 100,
            empirical_win_rate: 0.3,
            market_avg_ask: 0.4,
            true_edge: -0.1,
        });
        let cfg = FilterConfig::default();
        let cal_cfg = CalibrationConfig::default();
        let source_cfg = weather_config::ForecastSourceConfig::default();
        let gate = calibration_gate(&c, &cal_cfg);
        assert_eq!(gate, CalibrationGate::Blocks);
        assert_eq!(first_blocking_reason(&c, &cfg, &cal_cfg, &source_cfg, gate), Some("calBlocksEdge"));
    }
}
