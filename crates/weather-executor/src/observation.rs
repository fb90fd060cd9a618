use crate::dedup::FastPathDedup;
use crate::error::ExecutorResult;
use crate::sizing::{size_metar_guaranteed_win, size_pws_guaranteed_win, SizedPosition};
use chrono::NaiveDate;
use weather_config::{ObservationConfig, SizingConfig};
use weather_platform::entry_fee;
use weather_storage::{EntryReason, NewTrade, Platform, RangeType, Side, StorageGateway, Trade};

/// A range the observation path has detected as already decided (the
/// current running high has crossed a range boundary) and wants to enter
/// immediately, bypassing the scanner's edge-based filter chain entirely.
pub struct ObservationCandidate {
    pub city: String,
    pub target_date: NaiveDate,
    pub platform: Platform,
    pub market_id: String,
    pub range_name: String,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub range_type: RangeType,
    pub side: Side,
    pub unit: String,
    pub ask: f64,
    pub bid: f64,
    pub spread: f64,
    pub volume: f64,
    pub observation_high: f64,
    pub wu_high: f64,
}

pub enum ObservationOutcome {
    Opened(Trade),
    Blocked(&'static str),
}

/// PWS fast path: three-station corrected-median spike, sized by
/// confidence (`city_factor`/`time_factor`). Guards the detection race
/// with the in-memory dedup set before ever touching storage, since two
/// concurrent poll cycles can both observe the spike before either commits.
#[allow(clippy::too_many_arguments)]
pub async fn execute_pws_guaranteed_win(
    storage: &StorageGateway,
    dedup: &FastPathDedup,
    candidate: ObservationCandidate,
    avg_corrected_error: f64,
    local_hour: f64,
    bankroll_total: f64,
    obs_cfg: &ObservationConfig,
    sizing_cfg: &SizingConfig,
) -> ExecutorResult<ObservationOutcome> {
    if !dedup.try_claim(
        &candidate.city,
        candidate.target_date,
        candidate.platform,
        &candidate.range_name,
        candidate.side,
    ) {
        return Ok(ObservationOutcome::Blocked("fast_path_dedup"));
    }

    if storage
        .dedup_exists(
            &candidate.city,
            candidate.target_date,
            candidate.platform,
            &candidate.range_name,
            candidate.side,
        )
        .await?
    {
        dedup.release(
            &candidate.city,
            candidate.target_date,
            candidate.platform,
            &candidate.range_name,
            candidate.side,
        );
        return Ok(ObservationOutcome::Blocked("dedup"));
    }

    let ask = candidate.ask.clamp(obs_cfg.min_ask, obs_cfg.max_ask);
    let Some(SizedPosition { shares, cost, .. }) = size_pws_guaranteed_win(
        bankroll_total,
        avg_corrected_error,
        local_hour,
        obs_cfg,
        sizing_cfg,
        candidate.platform,
        ask,
    ) else {
        dedup.release(
            &candidate.city,
            candidate.target_date,
            candidate.platform,
            &candidate.range_name,
            candidate.side,
        );
        return Ok(ObservationOutcome::Blocked("sizing_below_min_bet"));
    };

    let fee = entry_fee(candidate.platform, ask) * shares;
    let trade = storage
        .insert_trade(NewTrade {
            city: candidate.city,
            target_date: candidate.target_date,
            platform: candidate.platform,
            market_id: candidate.market_id,
            range_name: candidate.range_name,
            range_min: candidate.range_min,
            range_max: candidate.range_max,
            range_type: candidate.range_type,
            side: candidate.side,
            unit: candidate.unit,
            entry_ask: ask,
            entry_bid: candidate.bid,
            entry_spread: candidate.spread,
            entry_volume: candidate.volume,
            forecast_temp: candidate.observation_high,
            forecast_confidence: 1.0,
            forecast_std_dev: 0.0,
            ensemble_breakdown: serde_json::json!({}),
            edge: 1.0 - ask,
            kelly_fraction: sizing_cfg.kelly_fraction,
            entry_reason: EntryReason::GuaranteedWinPws,
            shares,
            cost,
            entry_fee: fee,
            observation_high: Some(candidate.observation_high),
            wu_high: Some(candidate.wu_high),
        })
        .await?;

    Ok(ObservationOutcome::Opened(trade))
}

/// METAR/authoritative-source path: flat sizing against an isolated paper
/// bankroll, guarded only by the durable dedup gate (no PWS spike to race
/// against -- the hourly observation either crossed the boundary or it
/// didn't).
pub async fn execute_metar_guaranteed_win(
    storage: &StorageGateway,
    candidate: ObservationCandidate,
    obs_cfg: &ObservationConfig,
    sizing_cfg: &SizingConfig,
) -> ExecutorResult<ObservationOutcome> {
    if storage
        .dedup_exists(
            &candidate.city,
            candidate.target_date,
            candidate.platform,
            &candidate.range_name,
            candidate.side,
        )
        .await?
    {
        return Ok(ObservationOutcome::Blocked("dedup"));
    }

    let ask = candidate.ask.clamp(obs_cfg.min_ask, obs_cfg.max_ask);
    let Some(SizedPosition { shares, cost, .. }) =
        size_metar_guaranteed_win(obs_cfg, sizing_cfg, candidate.platform, ask)
    else {
        return Ok(ObservationOutcome::Blocked("sizing_below_min_bet"));
    };

    let fee = entry_fee(candidate.platform, ask) * shares;
    let trade = storage
        .insert_trade(NewTrade {
            city: candidate.city,
            target_date: candidate.target_date,
            platform: candidate.platform,
            market_id: candidate.market_id,
            range_name: candidate.range_name,
            range_min: candidate.range_min,
            range_max: candidate.range_max,
            range_type: candidate.range_type,
            side: candidate.side,
            unit: candidate.unit,
            entry_ask: ask,
            entry_bid: candidate.bid,
            entry_spread: candidate.spread,
            entry_volume: candidate.volume,
            forecast_temp: candidate.observation_high,
            forecast_confidence: 1.0,
            forecast_std_dev: 0.0,
            ensemble_breakdown: serde_json::json!({}),
            edge: 1.0 - ask,
            kelly_fraction: sizing_cfg.kelly_fraction,
            entry_reason: EntryReason::GuaranteedWin,
            shares,
            cost,
            entry_fee: fee,
            observation_high: Some(candidate.observation_high),
            wu_high: Some(candidate.wu_high),
        })
        .await?;

    Ok(ObservationOutcome::Opened(trade))
}
