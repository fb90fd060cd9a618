use weather_config::{ObservationConfig, SizingConfig};
use weather_numerics::kelly_fraction_fractional;
use weather_platform::effective_cost;
use weather_storage::Platform;

/// Dollars and shares for one sized position. `cost` is contract cost only
/// (`shares * ask`); fees are tracked separately downstream so P&L
/// attribution doesn't conflate the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedPosition {
    pub shares: f64,
    pub cost: f64,
    pub dollars_allocated: f64,
}

/// Edge-trade sizing: half-Kelly (or whatever fraction is configured),
/// clamped by the max-bankroll-percentage cap and by whatever bankroll is
/// actually still available this cycle.
pub fn size_edge_trade(
    platform: Platform,
    ask: f64,
    true_probability: f64,
    bankroll_total: f64,
    available_bankroll: f64,
    visible_volume: f64,
    cfg: &SizingConfig,
) -> Option<SizedPosition> {
    let kelly = kelly_fraction_fractional(ask, 1.0, true_probability, cfg.kelly_fraction);
    let kelly_dollars = kelly * bankroll_total;
    let cap_dollars = cfg.max_bankroll_pct * bankroll_total;
    let volume_cap_dollars = cfg.max_volume_pct * visible_volume;
    let dollars = kelly_dollars.min(cap_dollars).min(available_bankroll).min(volume_cap_dollars);

    if dollars < cfg.min_bet {
        return None;
    }

    let cost_per_share = effective_cost(platform, ask);
    if cost_per_share <= 0.0 {
        return None;
    }
    let shares = (dollars / cost_per_share).floor();
    if shares < 1.0 {
        return None;
    }

    Some(SizedPosition { shares, cost: shares * ask, dollars_allocated: dollars })
}

/// Pre-sizing liquidity gate: reject outright when even the
/// bankroll-percentage cap alone would already exceed the configured
/// fraction of the market's visible volume, rather than silently sizing
/// down into an illiquid market.
pub fn volume_gate_blocks(bankroll_total: f64, visible_volume: f64, cfg: &SizingConfig) -> bool {
    if visible_volume <= 0.0 {
        return true;
    }
    cfg.max_bankroll_pct * bankroll_total > cfg.hard_reject_volume_pct * visible_volume
}

/// `clamp((MAX_ERR - avg_err) / MAX_ERR, min_factor, 1)` -- a city whose
/// PWS-corrected error is at or beyond `MAX_ERR` gets the floor weight
/// regardless of how early in the day the detection fires.
pub fn city_factor(avg_corrected_error: f64, cfg: &ObservationConfig) -> f64 {
    let max_err = cfg.pws_max_avg_corrected_error;
    if max_err <= 0.0 {
        return cfg.pws_min_confidence_factor;
    }
    let raw = (max_err - avg_corrected_error) / max_err;
    raw.clamp(cfg.pws_min_confidence_factor, 1.0)
}

/// Linear decay from 1.0 at `pws_time_full_hours` local time to
/// `pws_min_confidence_factor` at `pws_time_reduced_hours`. Flat sizing
/// over-exposes late-hour entries, when there's less of the day left for
/// a spike to be confirmed by a second reading.
pub fn time_factor(local_hour: f64, cfg: &ObservationConfig) -> f64 {
    let full = cfg.pws_time_full_hours;
    let reduced = cfg.pws_time_reduced_hours;
    if local_hour <= full {
        return 1.0;
    }
    if local_hour >= reduced {
        return cfg.pws_min_confidence_factor;
    }
    let span = (reduced - full).max(1e-9);
    let t = (local_hour - full) / span;
    1.0 - t * (1.0 - cfg.pws_min_confidence_factor)
}

/// Observation-path (PWS) sizing: confidence-weighted dollars against the
/// main bankroll, floored by the sizing config's minimum bet.
pub fn size_pws_guaranteed_win(
    bankroll_total: f64,
    avg_corrected_error: f64,
    local_hour: f64,
    cfg: &ObservationConfig,
    sizing_cfg: &SizingConfig,
    platform: Platform,
    ask: f64,
) -> Option<SizedPosition> {
    let dollars = bankroll_total * cfg.max_bankroll_pct_gw * city_factor(avg_corrected_error, cfg)
        * time_factor(local_hour, cfg);
    if dollars < sizing_cfg.min_bet {
        return None;
    }
    let cost_per_share = effective_cost(platform, ask);
    if cost_per_share <= 0.0 {
        return None;
    }
    let shares = (dollars / cost_per_share).floor();
    if shares < 1.0 {
        return None;
    }
    Some(SizedPosition { shares, cost: shares * ask, dollars_allocated: dollars })
}

/// METAR-path sizing: flat percentage of a smaller, isolated paper
/// bankroll kept separate from the main book so an authoritative-source
/// surprise can't cascade into the edge/PWS bankrolls.
pub fn size_metar_guaranteed_win(
    cfg: &ObservationConfig,
    sizing_cfg: &SizingConfig,
    platform: Platform,
    ask: f64,
) -> Option<SizedPosition> {
    let dollars = cfg.metar_isolated_bankroll * cfg.metar_flat_pct;
    if dollars < sizing_cfg.min_bet {
        return None;
    }
    let cost_per_share = effective_cost(platform, ask);
    if cost_per_share <= 0.0 {
        return None;
    }
    let shares = (dollars / cost_per_share).floor();
    if shares < 1.0 {
        return None;
    }
    Some(SizedPosition { shares, cost: shares * ask, dollars_allocated: dollars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn edge_sizing_matches_half_kelly_worked_example() {
        // p=0.80, ask=0.75, payout=1.0, half-Kelly => 0.10 of bankroll.
        let cfg = SizingConfig {
            kelly_fraction: 0.5,
            yes_bankroll: 1000.0,
            no_bankroll: 500.0,
            no_max_per_date: 150.0,
            max_bankroll_pct: 0.50,
            min_bet: 1.0,
            max_volume_pct: 0.05,
            hard_reject_volume_pct: 0.15,
        };
        let sized = size_edge_trade(Platform::Polymarket, 0.75, 0.80, 1000.0, 1000.0, 100_000.0, &cfg).unwrap();
        assert_relative_eq!(sized.dollars_allocated, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn edge_sizing_respects_available_bankroll_floor() {
        let cfg = SizingConfig {
            kelly_fraction: 0.5,
            yes_bankroll: 1000.0,
            no_bankroll: 500.0,
            no_max_per_date: 150.0,
            max_bankroll_pct: 0.50,
            min_bet: 1.0,
            max_volume_pct: 0.05,
            hard_reject_volume_pct: 0.15,
        };
        let sized = size_edge_trade(Platform::Polymarket, 0.75, 0.80, 1000.0, 5.0, 100_000.0, &cfg);
        assert!(sized.unwrap().dollars_allocated <= 5.0);
    }

    #[test]
    fn city_factor_floors_at_min_when_error_exceeds_ceiling() {
        let cfg = ObservationConfig {
            min_margin_cents: 3,
            max_ask: 0.92,
            min_ask: 0.05,
            min_ask_dual_confirmed: 0.10,
            max_bankroll_pct_gw: 0.15,
            metar_only_min_gap_f: 1.5,
            metar_only_min_gap_c: 0.8,
            pws_max_avg_corrected_error: 1.2,
            pws_min_confidence_factor: 0.25,
            pws_time_full_hours: 12.0,
            pws_time_reduced_hours: 15.0,
            metar_isolated_bankroll: 200.0,
            metar_flat_pct: 0.08,
        };
        assert_eq!(city_factor(5.0, &cfg), 0.25);
        assert_eq!(city_factor(0.0, &cfg), 1.0);
    }

    #[test]
    fn time_factor_decays_linearly_between_full_and_reduced() {
        let cfg = ObservationConfig {
            min_margin_cents: 3,
            max_ask: 0.92,
            min_ask: 0.05,
            min_ask_dual_confirmed: 0.10,
            max_bankroll_pct_gw: 0.15,
            metar_only_min_gap_f: 1.5,
            metar_only_min_gap_c: 0.8,
            pws_max_avg_corrected_error: 1.2,
            pws_min_confidence_factor: 0.25,
            pws_time_full_hours: 12.0,
            pws_time_reduced_hours: 15.0,
            metar_isolated_bankroll: 200.0,
            metar_flat_pct: 0.08,
        };
        assert_relative_eq!(time_factor(12.0, &cfg), 1.0);
        assert_relative_eq!(time_factor(15.0, &cfg), 0.25);
        let mid = time_factor(13.5, &cfg);
        assert!(mid > 0.25 && mid < 1.0);
    }
}
