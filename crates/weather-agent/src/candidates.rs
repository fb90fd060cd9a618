//! Turns one city's fetched markets plus a forecast pass into the
//! `ScanCandidate` pairs the scanner's filter chain evaluates. One
//! `Market` always yields two candidates (YES and NO legs) since both
//! sides trade independently against the same quote.

use chrono::{DateTime, Utc};
use weather_config::CalibrationConfig;
use weather_forecast::{probability_for_range, ForecastOutput};
use weather_platform::Market;
use weather_scanner::ScanCandidate;
use weather_storage::{RangeType, Side, StorageGateway, StorageResult};

/// Weighted average of each bounded range's midpoint, weighted by its YES
/// ask -- the market's own implied mean temperature, independent of any
/// one range's edge. Falls back to the forecast mean itself (making the
/// divergence gate a no-op) when no bounded range has a usable ask, which
/// only happens for a city trading solely unbounded tail ranges.
pub fn market_implied_mean(markets: &[Market], forecast_mean: f64) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for m in markets {
        if let (RangeType::Bounded, Some(lo), Some(hi)) = (m.range_type, m.range_min, m.range_max) {
            let weight = m.yes_ask.max(0.0);
            if weight > 0.0 {
                weighted_sum += weight * ((lo + hi) / 2.0);
                weight_total += weight;
            }
        }
    }
    if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        forecast_mean
    }
}

fn lead_time_bucket(close_time: DateTime<Utc>, evaluated_at: DateTime<Utc>) -> i32 {
    let hours = ((close_time - evaluated_at).num_minutes() as f64 / 60.0).max(0.0);
    ((hours / 6.0).floor() as i32).clamp(0, 7)
}

fn price_bucket(ask: f64) -> i32 {
    ((ask.clamp(0.0, 1.0) * 10.0).floor() as i32).clamp(0, 9)
}

/// Build both legs of one market. `city_mae` and `current_observation_high`
/// are looked up once per city per cycle by the caller and passed in, since
/// they're shared across every market for that city.
pub async fn build_candidate_pair(
    storage: &StorageGateway,
    market: Market,
    forecast: &ForecastOutput,
    market_implied_mean: f64,
    city_mae: f64,
    current_observation_high: Option<f64>,
    kalshi_city_blocked: bool,
    cal_cfg: &CalibrationConfig,
    evaluated_at: DateTime<Utc>,
    close_time: DateTime<Utc>,
) -> StorageResult<(ScanCandidate, ScanCandidate)> {
    let (raw_probability, corrected_probability, model_prob_bucket) = probability_for_range(
        storage,
        market.range_type,
        market.range_min,
        market.range_max,
        forecast.mean,
        forecast.std_dev,
        cal_cfg,
    )
    .await?;

    let lead_bucket = lead_time_bucket(close_time, evaluated_at);
    let platform = market.platform;
    let range_type = market.range_type;

    let yes_price_bucket = price_bucket(market.yes_ask);
    let yes_calibration = storage
        .lookup_market_calibration(platform, range_type, lead_bucket, yes_price_bucket)
        .await?;
    let no_price_bucket = price_bucket(market.no_ask);
    let no_calibration = storage
        .lookup_market_calibration(platform, range_type, lead_bucket, no_price_bucket)
        .await?;

    let yes = ScanCandidate {
        market: market.clone(),
        side: Side::Yes,
        platform_trading_disabled: false,
        kalshi_city_blocked,
        forecast_mean: forecast.mean,
        forecast_std_dev: forecast.std_dev,
        market_implied_mean,
        city_mae,
        current_observation_high,
        close_time,
        evaluated_at,
        raw_probability,
        corrected_probability,
        model_prob_bucket,
        market_calibration: yes_calibration,
    };

    let no = ScanCandidate {
        market,
        side: Side::No,
        platform_trading_disabled: false,
        kalshi_city_blocked,
        forecast_mean: forecast.mean,
        forecast_std_dev: forecast.std_dev,
        market_implied_mean,
        city_mae,
        current_observation_high,
        close_time,
        evaluated_at,
        raw_probability: 1.0 - raw_probability,
        corrected_probability: 1.0 - corrected_probability,
        model_prob_bucket,
        market_calibration: no_calibration,
    };

    Ok((yes, no))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_storage::Platform;

    fn bounded_market(yes_ask: f64, lo: f64, hi: f64) -> Market {
        Market {
            platform: Platform::Polymarket,
            market_id: "m".into(),
            city: "nyc".into(),
            target_date: Utc::now().date_naive(),
            range_name: format!("{lo}-{hi}"),
            range_min: Some(lo),
            range_max: Some(hi),
            range_type: RangeType::Bounded,
            yes_ask,
            yes_bid: yes_ask - 0.02,
            no_ask: 1.0 - yes_ask,
            no_bid: 1.0 - yes_ask - 0.02,
            volume: 1000.0,
        }
    }

    #[test]
    fn implied_mean_weights_by_yes_ask() {
        let markets = vec![bounded_market(0.8, 33.5, 35.5), bounded_market(0.1, 35.5, 37.5)];
        let mean = market_implied_mean(&markets, 50.0);
        // Dominated by the higher-ask range's midpoint (34.5), not the
        // unweighted average of the two midpoints (35.5).
        assert!((mean - 34.5).abs() < 1.0);
    }

    #[test]
    fn implied_mean_falls_back_to_forecast_mean_with_no_bounded_ranges() {
        let markets = vec![];
        assert_eq!(market_implied_mean(&markets, 42.0), 42.0);
    }

    #[test]
    fn lead_time_bucket_clamps_to_eight_buckets() {
        let now = Utc::now();
        assert_eq!(lead_time_bucket(now + chrono::Duration::hours(100), now), 7);
        assert_eq!(lead_time_bucket(now - chrono::Duration::hours(1), now), 0);
    }
}
