//! Environment-driven configuration for the weather trading engine,
//! grouped by concern the way spec.md §6 groups recognized options.

mod city;
mod groups;

pub use city::{default_cities, toronto, CityConfig, Unit};
pub use groups::{
    CalibrationConfig, FilterConfig, ForecastSourceConfig, MonitorConfig, ObservationConfig,
    SchedulingConfig, SizingConfig,
};

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scheduling: SchedulingConfig,
    pub filters: FilterConfig,
    pub calibration: CalibrationConfig,
    pub sizing: SizingConfig,
    pub observation: ObservationConfig,
    pub forecast_sources: ForecastSourceConfig,
    pub monitor: MonitorConfig,
    pub cities: Vec<CityConfig>,

    pub database_url: String,
    pub database_max_connections: u32,

    pub polymarket_api_key: Option<String>,
    pub kalshi_api_key: Option<String>,
    pub kalshi_private_key_pem: Option<String>,

    pub discord_webhook_url: Option<String>,

    /// Commercial forecast source is dropped from the ensemble entirely
    /// when this is unset, rather than running keyless.
    pub forecast_commercial_api_key: Option<String>,

    pub paper_trading: bool,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}: invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

impl EngineConfig {
    /// Load configuration from the process environment. Required secrets
    /// (platform API keys) are read as `Option` here — the executor/platform
    /// crates fail fast at first use if a paper-only stub key is absent and
    /// live trading was requested, matching spec.md's explicit non-goal of
    /// never executing against real funds from this engine by default.
    pub fn from_env() -> Result<Self> {
        let cities = match env::var("CITIES_JSON") {
            Ok(raw) => serde_json::from_str(&raw).context("CITIES_JSON is not valid JSON")?,
            Err(_) => default_cities(),
        };

        Ok(Self {
            scheduling: SchedulingConfig {
                scan_interval_minutes: env_parse("SCAN_INTERVAL_MINUTES", 5)?,
                observation_poll_interval_seconds: env_parse(
                    "OBSERVATION_POLL_INTERVAL_SECONDS",
                    30,
                )?,
                observation_poll_interval_seconds_peak: env_parse(
                    "OBSERVATION_POLL_INTERVAL_SECONDS_PEAK",
                    10,
                )?,
                guaranteed_win_scan_interval_seconds: env_parse(
                    "GUARANTEED_WIN_SCAN_INTERVAL_SECONDS",
                    15,
                )?,
            },
            filters: FilterConfig {
                min_edge_pct: env_parse("MIN_EDGE_PCT", 0.03)?,
                max_spread: env_parse("MAX_SPREAD", 0.08)?,
                max_spread_pct: env_parse("MAX_SPREAD_PCT", 0.15)?,
                min_ask_yes: env_parse("MIN_ASK_YES", 0.02)?,
                min_ask_no: env_parse("MIN_ASK_NO", 0.20)?,
                max_ask_no: env_parse("MAX_ASK_NO", 0.30)?,
                min_hours_to_resolution: env_parse("MIN_HOURS_TO_RESOLUTION", 2.0)?,
                max_model_market_ratio: env_parse("MAX_MODEL_MARKET_RATIO", 3.0)?,
                max_market_divergence: env_parse("MAX_MARKET_DIVERGENCE", 4.0)?,
                max_std_range_ratio: env_parse("MAX_STD_RANGE_RATIO", 0.6)?,
            },
            calibration: CalibrationConfig {
                cal_blocks_min_n: env_parse("CAL_BLOCKS_MIN_N", 20)?,
                cal_confirms_min_n: env_parse("CAL_CONFIRMS_MIN_N", 50)?,
                cal_min_trade_edge: env_parse("CAL_MIN_TRADE_EDGE", 0.0)?,
                max_correction_ratio: env_parse("MAX_CORRECTION_RATIO", 2.0)?,
                rebuild_window_days: env_parse("CAL_REBUILD_WINDOW_DAYS", 60)?,
            },
            sizing: SizingConfig {
                kelly_fraction: env_parse("KELLY_FRACTION", 0.5)?,
                yes_bankroll: env_parse("YES_BANKROLL", 1000.0)?,
                no_bankroll: env_parse("NO_BANKROLL", 500.0)?,
                no_max_per_date: env_parse("NO_MAX_PER_DATE", 150.0)?,
                max_bankroll_pct: env_parse("MAX_BANKROLL_PCT", 0.10)?,
                min_bet: env_parse("MIN_BET", 1.0)?,
                max_volume_pct: env_parse("MAX_VOLUME_PCT", 0.05)?,
                hard_reject_volume_pct: env_parse("HARD_REJECT_VOLUME_PCT", 0.15)?,
            },
            observation: ObservationConfig {
                min_margin_cents: env_parse("MIN_MARGIN_CENTS", 3)?,
                max_ask: env_parse("OBS_MAX_ASK", 0.92)?,
                min_ask: env_parse("OBS_MIN_ASK", 0.05)?,
                min_ask_dual_confirmed: env_parse("MIN_ASK_DUAL_CONFIRMED", 0.10)?,
                max_bankroll_pct_gw: env_parse("MAX_BANKROLL_PCT_GW", 0.15)?,
                metar_only_min_gap_f: env_parse("METAR_ONLY_MIN_GAP_F", 1.5)?,
                metar_only_min_gap_c: env_parse("METAR_ONLY_MIN_GAP_C", 0.8)?,
                pws_max_avg_corrected_error: env_parse("PWS_MAX_AVG_CORRECTED_ERROR", 1.2)?,
                pws_min_confidence_factor: env_parse("PWS_MIN_CONFIDENCE_FACTOR", 0.25)?,
                pws_time_full_hours: env_parse("PWS_TIME_FULL_HOURS", 12.0)?,
                pws_time_reduced_hours: env_parse("PWS_TIME_REDUCED_HOURS", 15.0)?,
                metar_isolated_bankroll: env_parse("METAR_ISOLATED_BANKROLL", 200.0)?,
                metar_flat_pct: env_parse("METAR_FLAT_PCT", 0.08)?,
            },
            forecast_sources: ForecastSourceConfig {
                demotion_mae_ceiling_f: env_parse("DEMOTION_MAE_CEILING_F", 6.0)?,
                demotion_mae_ceiling_c: env_parse("DEMOTION_MAE_CEILING_C", 3.3)?,
                relative_demotion_factor: env_parse("RELATIVE_DEMOTION_FACTOR", 2.0)?,
                soft_demotion_weight_cap: env_parse("SOFT_DEMOTION_WEIGHT_CAP", 0.15)?,
                min_active_sources: env_parse("MIN_ACTIVE_SOURCES", 2)?,
                resolution_source_boost_factor: env_parse("RESOLUTION_SOURCE_BOOST_FACTOR", 1.5)?,
                city_mae_ceiling_bounded_f: env_parse("CITY_MAE_CEILING_BOUNDED_F", 2.5)?,
                city_mae_ceiling_unbounded_f: env_parse("CITY_MAE_CEILING_UNBOUNDED_F", 3.5)?,
            },
            monitor: MonitorConfig {
                take_profit_longshot_ask_max: env_parse("TAKE_PROFIT_LONGSHOT_ASK_MAX", 0.15)?,
                take_profit_longshot_bid_threshold: env_parse(
                    "TAKE_PROFIT_LONGSHOT_BID_THRESHOLD",
                    0.85,
                )?,
                take_profit_mid_ask_max: env_parse("TAKE_PROFIT_MID_ASK_MAX", 0.50)?,
                take_profit_mid_bid_threshold: env_parse("TAKE_PROFIT_MID_BID_THRESHOLD", 0.90)?,
                take_profit_favorite_bid_threshold: env_parse(
                    "TAKE_PROFIT_FAVORITE_BID_THRESHOLD",
                    0.95,
                )?,
                edge_gone_threshold: env_parse("EDGE_GONE_THRESHOLD", 0.10)?,
                evaluator_log_cap: env_parse("EVALUATOR_LOG_CAP", 20)?,
            },
            cities,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10)?,
            polymarket_api_key: env::var("POLYMARKET_API_KEY").ok(),
            kalshi_api_key: env::var("KALSHI_API_KEY").ok(),
            kalshi_private_key_pem: env::var("KALSHI_PRIVATE_KEY_PEM").ok(),
            discord_webhook_url: env::var("DISCORD_WEBHOOK_URL").ok(),
            forecast_commercial_api_key: env::var("FORECAST_COMMERCIAL_API_KEY").ok(),
            paper_trading: env_parse("PAPER_TRADING", true)?,
        })
    }

    pub fn city_by_name(&self, name: &str) -> Option<&CityConfig> {
        self.cities.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cities_are_unique_by_name() {
        let cities = default_cities();
        let mut names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), cities.len());
    }

    #[test]
    fn chicago_is_a_dual_station_city() {
        let cities = default_cities();
        let chicago = cities.iter().find(|c| c.name == "Chicago").unwrap();
        assert!(chicago.is_dual_station());
    }
}
