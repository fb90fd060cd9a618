use crate::candidate::ScanCandidate;
use crate::error::ScannerResult;
use crate::filters::{calibration_gate, first_blocking_reason, CalibrationGate};
use weather_config::{CalibrationConfig, FilterConfig, ForecastSourceConfig};
use weather_storage::{NewOpportunity, Opportunity, Side, StorageGateway};

/// One entered candidate, handed off to the executor.
pub struct EnteredCandidate {
    pub opportunity: Opportunity,
    pub calibration_confirmed: bool,
}

pub struct ScanSummary {
    pub entered: Vec<EnteredCandidate>,
    pub filtered_count: usize,
}

/// Run the filter chain over one candidate, persist the resulting
/// opportunity row (entered or filtered, the row always exists either
/// way -- this is what makes calibration honest), and return the entry
/// if it cleared every gate.
pub async fn evaluate_candidate(
    storage: &StorageGateway,
    candidate: ScanCandidate,
    filter_cfg: &FilterConfig,
    cal_cfg: &CalibrationConfig,
    source_cfg: &ForecastSourceConfig,
) -> ScannerResult<Option<EnteredCandidate>> {
    let gate = calibration_gate(&candidate, cal_cfg);
    let reason = first_blocking_reason(&candidate, filter_cfg, cal_cfg, source_cfg, gate);
    let entered = reason.is_none();

    let new_opp = NewOpportunity {
        city: candidate.market.city.clone(),
        target_date: candidate.market.target_date,
        platform: candidate.market.platform,
        market_id: candidate.market.market_id.clone(),
        range_name: candidate.market.range_name.clone(),
        range_min: candidate.market.range_min,
        range_max: candidate.market.range_max,
        range_type: candidate.market.range_type,
        side: candidate.side,
        ask: candidate.ask(),
        bid: candidate.bid(),
        spread: candidate.spread(),
        volume: candidate.market.volume,
        forecast_temp: candidate.forecast_mean,
        ensemble_std_dev: candidate.forecast_std_dev,
        source_disagreement: (candidate.forecast_mean - candidate.market_implied_mean).abs(),
        market_implied_mean: candidate.market_implied_mean,
        market_divergence: (candidate.forecast_mean - candidate.market_implied_mean).abs(),
        distance_to_near_edge: candidate.distance_to_near_edge(),
        distance_to_far_edge: candidate.distance_to_far_edge(),
        kelly_fraction: 0.0, // filled in by the executor once sizing runs
        raw_probability: candidate.raw_probability,
        corrected_probability: candidate.corrected_probability,
        edge: candidate.edge(),
        model_prob_bucket: candidate.model_prob_bucket,
        lead_time_bucket: candidate.lead_time_bucket(),
        price_bucket: candidate.price_bucket(),
        filter_reason: reason.map(|r| r.to_string()),
        action: if entered { "entered".to_string() } else { "filtered".to_string() },
    };

    let opportunity = storage.insert_opportunity(new_opp).await?;

    if entered {
        Ok(Some(EnteredCandidate {
            opportunity,
            calibration_confirmed: gate == CalibrationGate::Confirms,
        }))
    } else {
        Ok(None)
    }
}

/// Fold the per-candidate evaluation results of a full cycle into one
/// summary for the coordinator to log.
pub fn summarize(results: Vec<Option<EnteredCandidate>>) -> ScanSummary {
    let filtered_count = results.iter().filter(|r| r.is_none()).count();
    let entered = results.into_iter().flatten().collect();
    ScanSummary { entered, filtered_count }
}

/// Evaluate both sides of one market and return whichever side(s) entered.
/// A market can legitimately enter on at most one side in practice (YES
/// and NO edges rarely both clear the chain), but nothing here enforces
/// that -- the executor's dedup gate is the authoritative guard.
pub async fn evaluate_market_both_sides(
    storage: &StorageGateway,
    yes_candidate: ScanCandidate,
    no_candidate: ScanCandidate,
    filter_cfg: &FilterConfig,
    cal_cfg: &CalibrationConfig,
    source_cfg: &ForecastSourceConfig,
) -> ScannerResult<Vec<EnteredCandidate>> {
    debug_assert_eq!(yes_candidate.side, Side::Yes);
    debug_assert_eq!(no_candidate.side, Side::No);

    let mut out = Vec::new();
    if let Some(e) = evaluate_candidate(storage, yes_candidate, filter_cfg, cal_cfg, source_cfg).await? {
        out.push(e);
    }
    if let Some(e) = evaluate_candidate(storage, no_candidate, filter_cfg, cal_cfg, source_cfg).await? {
        out.push(e);
    }
    Ok(out)
}
