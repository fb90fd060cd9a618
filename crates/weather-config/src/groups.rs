use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    pub scan_interval_minutes: u64,
    pub observation_poll_interval_seconds: u64,
    /// Tighter poll interval used when any configured city is in its local
    /// peak hours (late morning through afternoon, when boundary crossings
    /// cluster).
    pub observation_poll_interval_seconds_peak: u64,
    pub guaranteed_win_scan_interval_seconds: u64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            scan_interval_minutes: 5,
            observation_poll_interval_seconds: 30,
            observation_poll_interval_seconds_peak: 10,
            guaranteed_win_scan_interval_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_edge_pct: f64,
    pub max_spread: f64,
    pub max_spread_pct: f64,
    pub min_ask_yes: f64,
    pub min_ask_no: f64,
    pub max_ask_no: f64,
    pub min_hours_to_resolution: f64,
    pub max_model_market_ratio: f64,
    pub max_market_divergence: f64,
    pub max_std_range_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_edge_pct: 0.03,
            max_spread: 0.08,
            max_spread_pct: 0.15,
            min_ask_yes: 0.02,
            min_ask_no: 0.20,
            max_ask_no: 0.30,
            min_hours_to_resolution: 2.0,
            max_model_market_ratio: 3.0,
            max_market_divergence: 4.0,
            max_std_range_ratio: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub cal_blocks_min_n: i64,
    pub cal_confirms_min_n: i64,
    pub cal_min_trade_edge: f64,
    pub max_correction_ratio: f64,
    /// Rolling window (days) the resolver rebuilds model/market/city
    /// calibration tables from. Wider windows smooth noise but react
    /// slower to a forecast-source regression.
    pub rebuild_window_days: i64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            cal_blocks_min_n: 20,
            cal_confirms_min_n: 50,
            cal_min_trade_edge: 0.0,
            max_correction_ratio: 2.0,
            rebuild_window_days: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    pub kelly_fraction: f64,
    pub yes_bankroll: f64,
    pub no_bankroll: f64,
    pub no_max_per_date: f64,
    pub max_bankroll_pct: f64,
    pub min_bet: f64,
    pub max_volume_pct: f64,
    pub hard_reject_volume_pct: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: 0.5,
            yes_bankroll: 1000.0,
            no_bankroll: 500.0,
            no_max_per_date: 150.0,
            max_bankroll_pct: 0.10,
            min_bet: 1.0,
            max_volume_pct: 0.05,
            hard_reject_volume_pct: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationConfig {
    pub min_margin_cents: i64,
    pub max_ask: f64,
    pub min_ask: f64,
    pub min_ask_dual_confirmed: f64,
    pub max_bankroll_pct_gw: f64,
    pub metar_only_min_gap_f: f64,
    pub metar_only_min_gap_c: f64,
    pub pws_max_avg_corrected_error: f64,
    pub pws_min_confidence_factor: f64,
    pub pws_time_full_hours: f64,
    pub pws_time_reduced_hours: f64,
    pub metar_isolated_bankroll: f64,
    pub metar_flat_pct: f64,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
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
        }
    }
}

/// Tier-based take-profit thresholds and the edge-gone decay threshold
/// the monitor's signal chain evaluates each cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub take_profit_longshot_ask_max: f64,
    pub take_profit_longshot_bid_threshold: f64,
    pub take_profit_mid_ask_max: f64,
    pub take_profit_mid_bid_threshold: f64,
    pub take_profit_favorite_bid_threshold: f64,
    pub edge_gone_threshold: f64,
    pub evaluator_log_cap: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            take_profit_longshot_ask_max: 0.15,
            take_profit_longshot_bid_threshold: 0.85,
            take_profit_mid_ask_max: 0.50,
            take_profit_mid_bid_threshold: 0.90,
            take_profit_favorite_bid_threshold: 0.95,
            edge_gone_threshold: 0.10,
            evaluator_log_cap: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSourceConfig {
    pub demotion_mae_ceiling_f: f64,
    pub demotion_mae_ceiling_c: f64,
    pub relative_demotion_factor: f64,
    pub soft_demotion_weight_cap: f64,
    pub min_active_sources: usize,
    pub resolution_source_boost_factor: f64,
    pub city_mae_ceiling_bounded_f: f64,
    pub city_mae_ceiling_unbounded_f: f64,
}

impl Default for ForecastSourceConfig {
    fn default() -> Self {
        Self {
            demotion_mae_ceiling_f: 6.0,
            demotion_mae_ceiling_c: 3.3,
            relative_demotion_factor: 2.0,
            soft_demotion_weight_cap: 0.15,
            min_active_sources: 2,
            resolution_source_boost_factor: 1.5,
            city_mae_ceiling_bounded_f: 2.5,
            city_mae_ceiling_unbounded_f: 3.5,
        }
    }
}
