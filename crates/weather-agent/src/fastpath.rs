//! Pure candidate-selection logic for the guaranteed-win fast path.
//! Detection and sizing/execution already live in `weather_executor`
//! (`execute_pws_guaranteed_win` / `execute_metar_guaranteed_win`); this
//! module decides *which* candidate range(s), if any, are even worth
//! handing to those functions, applying the three defense-in-depth checks
//! the observation path needs beyond the executor's own dedup gate.

use weather_platform::Market;
use weather_storage::{Platform, Side, Trade};

/// Baseline margin a non-METAR-resolving platform's observation must clear
/// before a boundary crossing is trusted. METAR-resolving platforms use
/// the wider, config-driven `metar_only_min_gap` instead, since their
/// resolution source can diverge further from the polled observation.
pub const BASE_MIN_GAP_F: f64 = 0.5;
pub const BASE_MIN_GAP_C: f64 = 0.3;

/// Required margin an observation must exceed a range boundary by before
/// the fast path trusts it as a guaranteed-win crossing, for this
/// platform's resolution provenance.
pub fn min_gap_for(platform_is_metar_resolved: bool, metar_only_min_gap: f64, base_gap: f64) -> f64 {
    if platform_is_metar_resolved {
        metar_only_min_gap
    } else {
        base_gap
    }
}

/// True once `observation_high` clears `range_min` (or undercuts
/// `range_max` for a below-range NO) by at least the platform's min-gap.
pub fn crosses_boundary(range_min: Option<f64>, range_max: Option<f64>, observation_high: f64, min_gap: f64) -> bool {
    match (range_min, range_max) {
        (Some(lo), _) => observation_high >= lo + min_gap,
        (None, Some(hi)) => observation_high >= hi + min_gap,
        (None, None) => false,
    }
}

/// Defense-in-depth guard against correlated risk: skip a NO entry whose
/// range sits entirely below a YES range already held for the same
/// city/date, since both positions lose together if the temperature
/// climbs past the YES range's floor. Applied identically in the scanner,
/// the fast path, and the executor -- any one of the three catching it is
/// enough, but all three run.
pub fn blocked_by_adjacent_no(side: Side, range_max: Option<f64>, open_trades: &[Trade]) -> bool {
    if side != Side::No {
        return false;
    }
    let Some(no_ceiling) = range_max else {
        return false;
    };
    open_trades
        .iter()
        .any(|t| t.side == Side::Yes && t.range_min.map(|yes_floor| no_ceiling <= yes_floor).unwrap_or(false))
}

/// One platform's candidate range for the cross-platform dedup pass.
pub struct PlatformCandidate {
    pub platform: Platform,
    pub ask: f64,
}

/// Keep only the lowest-ask platform for a city/range/side that has
/// triggered on more than one platform simultaneously -- entering on every
/// platform that happened to cross at once would just be redundant
/// exposure to the same weather outcome.
pub fn lowest_ask_platform(candidates: &[PlatformCandidate]) -> Option<Platform> {
    candidates
        .iter()
        .min_by(|a, b| a.ask.partial_cmp(&b.ask).unwrap_or(std::cmp::Ordering::Equal))
        .map(|c| c.platform)
}

/// Pick the single highest observation among a market's raw per-reading
/// candidates, used to decide whether a newly-polled high actually moves
/// the needle over what's already recorded for the day.
pub fn is_new_high(candidate_high: f64, previous_high: Option<f64>) -> bool {
    previous_high.map(|prev| candidate_high > prev).unwrap_or(true)
}

pub fn market_range_bounds(market: &Market) -> (Option<f64>, Option<f64>) {
    (market.range_min, market.range_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use weather_storage::{EntryReason, RangeType, TradeStatus};

    fn trade(side: Side, range_min: Option<f64>, range_max: Option<f64>) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            city: "nyc".into(),
            target_date: Utc::now().date_naive(),
            platform: Platform::Polymarket,
            market_id: "m".into(),
            range_name: "x".into(),
            range_min,
            range_max,
            range_type: RangeType::Bounded,
            side,
            unit: "F".into(),
            entry_ask: 0.5,
            entry_bid: 0.45,
            entry_spread: 0.05,
            entry_volume: 1000.0,
            forecast_temp: 50.0,
            forecast_confidence: 1.0,
            forecast_std_dev: 1.0,
            ensemble_breakdown: serde_json::json!({}),
            edge: 0.1,
            kelly_fraction: 0.1,
            entry_reason: EntryReason::Edge,
            shares: 10.0,
            cost: 5.0,
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
            max_price_seen: Some(0.5),
            min_probability_seen: Some(0.5),
            evaluator_log: serde_json::json!([]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn metar_resolved_platform_uses_the_wider_gap() {
        assert_eq!(min_gap_for(true, 1.5, BASE_MIN_GAP_F), 1.5);
        assert_eq!(min_gap_for(false, 1.5, BASE_MIN_GAP_F), BASE_MIN_GAP_F);
    }

    #[test]
    fn crosses_boundary_requires_clearing_the_gap() {
        assert!(!crosses_boundary(Some(50.0), Some(51.0), 50.3, 0.5));
        assert!(crosses_boundary(Some(50.0), Some(51.0), 50.6, 0.5));
    }

    #[test]
    fn adjacent_no_is_blocked_when_its_ceiling_sits_at_or_below_an_open_yes_floor() {
        let open = vec![trade(Side::Yes, Some(52.0), Some(53.0))];
        assert!(blocked_by_adjacent_no(Side::No, Some(51.0), &open));
        assert!(!blocked_by_adjacent_no(Side::No, Some(52.5), &open));
        assert!(!blocked_by_adjacent_no(Side::Yes, Some(51.0), &open));
    }

    #[test]
    fn cross_platform_dedup_keeps_the_lowest_ask() {
        let candidates = vec![
            PlatformCandidate { platform: Platform::Polymarket, ask: 0.66 },
            PlatformCandidate { platform: Platform::Kalshi, ask: 0.88 },
        ];
        assert_eq!(lowest_ask_platform(&candidates), Some(Platform::Polymarket));
    }

    #[test]
    fn is_new_high_requires_strictly_exceeding_the_previous() {
        assert!(is_new_high(51.0, Some(50.0)));
        assert!(!is_new_high(50.0, Some(50.0)));
        assert!(is_new_high(51.0, None));
    }
}
