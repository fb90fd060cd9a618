use crate::bankroll::{Bankroll, NoDateCap};
use crate::error::ExecutorResult;
use crate::sizing::{size_edge_trade, volume_gate_blocks, SizedPosition};
use weather_config::SizingConfig;
use weather_platform::entry_fee;
use weather_scanner::EnteredCandidate;
use weather_storage::{EntryReason, NewTrade, Side, StorageGateway, Trade};

/// Outcome of running one entered candidate through the executor's gate
/// chain. A block always leaves the opportunity row updated to
/// `executor_blocked` with the reason that fired.
pub enum ExecutionOutcome {
    Opened(Trade),
    Blocked(&'static str),
}

/// Bankroll gate -> volume gate -> dedup gate -> sizing, in the order
/// spec.md §4.5 names them. Every rejection is written back to the
/// opportunity row so calibration queries can distinguish "never a
/// candidate" from "candidate the executor itself turned away".
pub async fn execute_edge_candidate(
    storage: &StorageGateway,
    bankroll: &mut Bankroll,
    no_date_cap: &mut NoDateCap,
    entered: &EnteredCandidate,
    unit: &str,
    cfg: &SizingConfig,
) -> ExecutorResult<ExecutionOutcome> {
    let opp = &entered.opportunity;

    let available = bankroll.available(opp.side);
    if available < cfg.min_bet {
        storage.mark_executor_blocked(opp.id, "bankroll_exhausted").await?;
        return Ok(ExecutionOutcome::Blocked("bankroll_exhausted"));
    }
    if opp.side == Side::No && no_date_cap.available() < cfg.min_bet {
        storage.mark_executor_blocked(opp.id, "no_date_cap_exhausted").await?;
        return Ok(ExecutionOutcome::Blocked("no_date_cap_exhausted"));
    }

    let bankroll_total = match opp.side {
        Side::Yes => cfg.yes_bankroll,
        Side::No => cfg.no_bankroll,
    };
    if volume_gate_blocks(bankroll_total, opp.volume, cfg) {
        storage.mark_executor_blocked(opp.id, "volume_hard_reject").await?;
        return Ok(ExecutionOutcome::Blocked("volume_hard_reject"));
    }

    if storage
        .dedup_exists(&opp.city, opp.target_date, opp.platform, &opp.range_name, opp.side)
        .await?
    {
        storage.mark_executor_blocked(opp.id, "dedup").await?;
        return Ok(ExecutionOutcome::Blocked("dedup"));
    }

    let available_for_sizing = if opp.side == Side::No {
        available.min(no_date_cap.available())
    } else {
        available
    };

    let Some(sized) = size_edge_trade(
        opp.platform,
        opp.ask,
        opp.corrected_probability,
        bankroll_total,
        available_for_sizing,
        opp.volume,
        cfg,
    ) else {
        storage.mark_executor_blocked(opp.id, "sizing_below_min_bet").await?;
        return Ok(ExecutionOutcome::Blocked("sizing_below_min_bet"));
    };

    let SizedPosition { shares, cost, .. } = sized;
    let fee = entry_fee(opp.platform, opp.ask) * shares;

    let new_trade = NewTrade {
        city: opp.city.clone(),
        target_date: opp.target_date,
        platform: opp.platform,
        market_id: opp.market_id.clone(),
        range_name: opp.range_name.clone(),
        range_min: opp.range_min,
        range_max: opp.range_max,
        range_type: opp.range_type,
        side: opp.side,
        unit: unit.to_string(),
        entry_ask: opp.ask,
        entry_bid: opp.bid,
        entry_spread: opp.spread,
        entry_volume: opp.volume,
        forecast_temp: opp.forecast_temp,
        forecast_confidence: opp.corrected_probability,
        forecast_std_dev: opp.ensemble_std_dev,
        ensemble_breakdown: serde_json::json!({}),
        edge: opp.edge,
        kelly_fraction: cfg.kelly_fraction,
        entry_reason: EntryReason::Edge,
        shares,
        cost,
        entry_fee: fee,
        observation_high: None,
        wu_high: None,
    };

    let trade = storage.insert_trade(new_trade).await?;
    bankroll.book(opp.side, cost);
    if opp.side == Side::No {
        no_date_cap.book(cost);
    }

    Ok(ExecutionOutcome::Opened(trade))
}
