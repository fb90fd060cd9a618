use crate::accuracy::record_trade_accuracy;
use crate::calibration::{build_city_error_distribution, build_market_calibration, build_model_calibration};
use crate::error::ResolverResult;
use crate::outcome::{settlement_pnl, trade_won};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use weather_config::CalibrationConfig;
use weather_storage::{Platform, StorageGateway};

#[derive(Debug, Clone, Copy, Default)]
pub struct MarketResolutionSummary {
    pub trades_resolved: usize,
    pub opportunities_backfilled: u64,
}

/// Wraps the resolver's per-market, per-window, and per-view operations.
/// Stateless: every call takes the `StorageGateway` it needs, matching the
/// scanner/monitor/executor crates' pattern of never caching DB state
/// in-process across cycles.
pub struct ResolverEngine;

impl ResolverEngine {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one market: upsert its canonical outcome, settle every open
    /// trade against it, backfill opportunity outcomes, and log per-source
    /// accuracy. `winning_range` must already reflect every range traded
    /// for this city/date (see `outcome::winning_range_label`) -- this
    /// function only ever touches the one market_id it's given.
    pub async fn resolve_market(
        &self,
        storage: &StorageGateway,
        market_id: &str,
        platform: Platform,
        actual_temp: f64,
        winning_range: &str,
        resolved_at: DateTime<Utc>,
        resolution_station: &str,
    ) -> ResolverResult<MarketResolutionSummary> {
        storage
            .upsert_market_resolution(market_id, platform, actual_temp, winning_range, resolved_at, resolution_station)
            .await?;

        let trades = storage.get_open_trades_for_market(market_id).await?;
        let mut trades_resolved = 0;
        for trade in &trades {
            let won = trade_won(trade, actual_temp);
            let pnl = settlement_pnl(trade, won);
            storage
                .mark_resolved(trade.id, won, actual_temp, pnl, trade.entry_fee, resolved_at, resolution_station)
                .await?;
            if let Err(e) = record_trade_accuracy(storage, trade, actual_temp).await {
                tracing::warn!("failed to record accuracy sample for trade {}: {}", trade.id, e);
            }
            tracing::info!(
                "resolved trade {} on {} ({}): won={} pnl={:.2}",
                trade.id, market_id, trade.range_name, won, pnl
            );
            trades_resolved += 1;
        }

        let opportunities_backfilled =
            storage.backfill_opportunity_outcomes(market_id, actual_temp, winning_range).await?;

        Ok(MarketResolutionSummary { trades_resolved, opportunities_backfilled })
    }

    /// Rebuild model_calibration, market_calibration, and
    /// city_error_distribution wholesale from a rolling window. Each
    /// table is truncated and rewritten inside its own transaction, so a
    /// crash mid-rebuild leaves at most one table stale, never corrupt.
    pub async fn rebuild_calibration(
        &self,
        storage: &StorageGateway,
        cal_cfg: &CalibrationConfig,
        as_of: NaiveDate,
    ) -> ResolverResult<()> {
        let since = as_of - Duration::days(cal_cfg.rebuild_window_days);

        let opportunities = storage.fetch_resolved_opportunities_since(since).await?;
        let model_inputs = build_model_calibration(&opportunities, cal_cfg.max_correction_ratio);
        let market_inputs = build_market_calibration(&opportunities);
        tracing::info!(
            "rebuilding calibration from {} opportunities since {}: {} model buckets, {} market buckets",
            opportunities.len(), since, model_inputs.len(), market_inputs.len()
        );
        storage.rebuild_model_calibration(model_inputs).await?;
        storage.rebuild_market_calibration(market_inputs).await?;

        let errors = storage.fetch_ensemble_errors_since(since).await?;
        storage.rebuild_city_error_distribution(build_city_error_distribution(&errors)).await?;

        Ok(())
    }

    pub async fn refresh_views(&self, storage: &StorageGateway) -> ResolverResult<()> {
        storage.refresh_materialized_views().await?;
        tracing::debug!("materialized views refreshed");
        Ok(())
    }
}

impl Default for ResolverEngine {
    fn default() -> Self {
        Self::new()
    }
}
