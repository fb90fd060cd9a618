use crate::error::StorageResult;
use crate::gateway::StorageGateway;
use crate::rows::TradeRow;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

fn f64_to_dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default()
}
fn opt_f64_to_dec(v: Option<f64>) -> Option<Decimal> {
    v.map(f64_to_dec)
}

/// Fields required to open a new trade. Separate from `Trade` because the
/// caller never supplies `id`, `status`, or `created_at`.
pub struct NewTrade {
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
    pub entry_ask: f64,
    pub entry_bid: f64,
    pub entry_spread: f64,
    pub entry_volume: f64,
    pub forecast_temp: f64,
    pub forecast_confidence: f64,
    pub forecast_std_dev: f64,
    pub ensemble_breakdown: serde_json::Value,
    pub edge: f64,
    pub kelly_fraction: f64,
    pub entry_reason: EntryReason,
    pub shares: f64,
    pub cost: f64,
    pub entry_fee: f64,
    pub observation_high: Option<f64>,
    pub wu_high: Option<f64>,
}

impl StorageGateway {
    pub async fn insert_trade(&self, t: NewTrade) -> StorageResult<Trade> {
        let row = sqlx::query_as::<_, TradeRow>(
            r#"
            INSERT INTO trades (
                city, target_date, platform, market_id, range_name, range_min, range_max,
                range_type, side, unit, entry_ask, entry_bid, entry_spread, entry_volume,
                forecast_temp, forecast_confidence, forecast_std_dev, ensemble_breakdown,
                edge, kelly_fraction, entry_reason, shares, cost, entry_fee,
                observation_high, wu_high
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
            )
            RETURNING *
            "#,
        )
        .bind(&t.city)
        .bind(t.target_date)
        .bind(t.platform.as_str())
        .bind(&t.market_id)
        .bind(&t.range_name)
        .bind(opt_f64_to_dec(t.range_min))
        .bind(opt_f64_to_dec(t.range_max))
        .bind(match t.range_type {
            RangeType::Bounded => "bounded",
            RangeType::Unbounded => "unbounded",
        })
        .bind(match t.side {
            Side::Yes => "yes",
            Side::No => "no",
        })
        .bind(&t.unit)
        .bind(f64_to_dec(t.entry_ask))
        .bind(f64_to_dec(t.entry_bid))
        .bind(f64_to_dec(t.entry_spread))
        .bind(f64_to_dec(t.entry_volume))
        .bind(f64_to_dec(t.forecast_temp))
        .bind(f64_to_dec(t.forecast_confidence))
        .bind(f64_to_dec(t.forecast_std_dev))
        .bind(t.ensemble_breakdown)
        .bind(f64_to_dec(t.edge))
        .bind(f64_to_dec(t.kelly_fraction))
        .bind(match t.entry_reason {
            EntryReason::Edge => "edge",
            EntryReason::GuaranteedWin => "guaranteed_win",
            EntryReason::GuaranteedWinPws => "guaranteed_win_pws",
        })
        .bind(f64_to_dec(t.shares))
        .bind(f64_to_dec(t.cost))
        .bind(f64_to_dec(t.entry_fee))
        .bind(opt_f64_to_dec(t.observation_high))
        .bind(opt_f64_to_dec(t.wu_high))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// True if a trade already exists for this key with status in
    /// {open, resolved}. Resolved is included so a cross-midnight
    /// enter -> resolve -> re-enter loop cannot occur when timezone
    /// handling diverges between components (spec.md §4.5).
    pub async fn dedup_exists(
        &self,
        city: &str,
        target_date: NaiveDate,
        platform: Platform,
        range_name: &str,
        side: Side,
    ) -> StorageResult<bool> {
        let side_str = match side {
            Side::Yes => "yes",
            Side::No => "no",
        };
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM trades
                WHERE city = $1 AND target_date = $2 AND platform = $3
                  AND range_name = $4 AND side = $5
                  AND status IN ('open', 'resolved')
            )
            "#,
        )
        .bind(city)
        .bind(target_date)
        .bind(platform.as_str())
        .bind(range_name)
        .bind(side_str)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn get_open_trades(&self) -> StorageResult<Vec<Trade>> {
        let rows = sqlx::query_as::<_, TradeRow>("SELECT * FROM trades WHERE status = 'open'")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Trade::from).collect())
    }

    pub async fn get_open_trades_for_city_date(
        &self,
        city: &str,
        target_date: NaiveDate,
    ) -> StorageResult<Vec<Trade>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades WHERE status = 'open' AND city = $1 AND target_date = $2",
        )
        .bind(city)
        .bind(target_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Trade::from).collect())
    }

    /// Every open trade against one market, regardless of city/date --
    /// the resolver keys off market_id, not (city, target_date), because
    /// a market can carry both YES and NO trades across several ranges.
    pub async fn get_open_trades_for_market(&self, market_id: &str) -> StorageResult<Vec<Trade>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades WHERE status = 'open' AND market_id = $1",
        )
        .bind(market_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Trade::from).collect())
    }

    /// Distinct market_ids with at least one open trade whose target_date
    /// has already passed `as_of` (caller supplies city-local "today" so
    /// resolution never keys off UTC).
    pub async fn open_markets_with_elapsed_target_date(
        &self,
        city: &str,
        as_of: NaiveDate,
    ) -> StorageResult<Vec<(String, Platform)>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            market_id: String,
            platform: Platform,
        }
        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT DISTINCT market_id, platform FROM trades
            WHERE status = 'open' AND city = $1 AND target_date < $2
            "#,
        )
        .bind(city)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| (r.market_id, r.platform)).collect())
    }

    /// Resolved trades within the rolling calibration window, used to
    /// rebuild market_calibration alongside `fetch_resolved_opportunities_since`.
    pub async fn fetch_resolved_trades_since(&self, since: NaiveDate) -> StorageResult<Vec<Trade>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades WHERE status = 'resolved' AND target_date >= $1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Trade::from).collect())
    }

    /// Sum of `cost` for all open trades on one side of the book (YES vs
    /// NO bankroll are tracked separately). Used at cycle start to
    /// reconstruct bankroll deterministically rather than carrying it as
    /// process-wide mutable state (spec.md §9).
    pub async fn sum_open_cost_by_side(&self, side: Side) -> StorageResult<f64> {
        use rust_decimal::prelude::ToPrimitive;
        let side_str = match side {
            Side::Yes => "yes",
            Side::No => "no",
        };
        let row: (Option<Decimal>,) =
            sqlx::query_as("SELECT SUM(cost) FROM trades WHERE status = 'open' AND side = $1")
                .bind(side_str)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0.and_then(|d| d.to_f64()).unwrap_or(0.0))
    }

    /// Sum of `cost` for open NO trades on one target date, used for the
    /// per-date NO bankroll cap (NO positions concentrate risk on a single
    /// day's outcome more than YES positions do).
    pub async fn sum_open_no_cost_by_date(&self, target_date: NaiveDate) -> StorageResult<f64> {
        use rust_decimal::prelude::ToPrimitive;
        let row: (Option<Decimal>,) = sqlx::query_as(
            "SELECT SUM(cost) FROM trades WHERE status = 'open' AND side = 'no' AND target_date = $1",
        )
        .bind(target_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0.and_then(|d| d.to_f64()).unwrap_or(0.0))
    }

    pub async fn mark_exited(
        &self,
        id: Uuid,
        exit_reason: ExitReason,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        pnl: f64,
        won: bool,
        actual_temp: Option<f64>,
        observation_high: Option<f64>,
        wu_high: Option<f64>,
    ) -> StorageResult<()> {
        let reason_str = match exit_reason {
            ExitReason::GuaranteedWin => "guaranteed_win",
            ExitReason::GuaranteedLoss => "guaranteed_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::EdgeGone => "edge_gone",
        };
        // Preserve observation_high/wu_high if already set -- never
        // overwrite with a later (possibly monitor-side) value.
        sqlx::query(
            r#"
            UPDATE trades SET
                status = 'exited',
                exit_reason = $2,
                exit_time = $3,
                exit_price = $4,
                pnl = $5,
                won = $6,
                actual_temp = COALESCE(actual_temp, $7),
                observation_high = COALESCE(observation_high, $8),
                wu_high = COALESCE(wu_high, $9)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reason_str)
        .bind(exit_time)
        .bind(f64_to_dec(exit_price))
        .bind(f64_to_dec(pnl))
        .bind(won)
        .bind(opt_f64_to_dec(actual_temp))
        .bind(opt_f64_to_dec(observation_high))
        .bind(opt_f64_to_dec(wu_high))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_resolved(
        &self,
        id: Uuid,
        won: bool,
        actual_temp: f64,
        pnl: f64,
        fees: f64,
        resolved_at: DateTime<Utc>,
        resolution_station: &str,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE trades SET
                status = 'resolved',
                won = $2,
                actual_temp = $3,
                pnl = $4,
                fees = $5,
                resolved_at = $6,
                resolution_station = $7
            WHERE id = $1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(won)
        .bind(f64_to_dec(actual_temp))
        .bind(f64_to_dec(pnl))
        .bind(f64_to_dec(fees))
        .bind(resolved_at)
        .bind(resolution_station)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_running_extremes(
        &self,
        id: Uuid,
        max_price_seen: f64,
        min_probability_seen: f64,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE trades SET
                max_price_seen = GREATEST(COALESCE(max_price_seen, 0), $2),
                min_probability_seen = LEAST(COALESCE(min_probability_seen, 1), $3)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(f64_to_dec(max_price_seen))
        .bind(f64_to_dec(min_probability_seen))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append a trimmed snapshot to the evaluator log, capped at `cap`
    /// entries (oldest dropped first).
    pub async fn append_evaluator_log(
        &self,
        id: Uuid,
        snapshot: serde_json::Value,
        cap: usize,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE trades SET evaluator_log = (
                SELECT jsonb_agg(elem) FROM (
                    SELECT elem FROM jsonb_array_elements(evaluator_log || $2::jsonb) AS elem
                    OFFSET GREATEST(jsonb_array_length(evaluator_log || $2::jsonb) - $3, 0)
                ) sub
            )
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(serde_json::json!([snapshot]))
        .bind(cap as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_roundtrip_preserves_precision_within_f64_tolerance() {
        let v = 0.3829_f64;
        let d = f64_to_dec(v);
        assert!((d.to_string().parse::<f64>().unwrap() - v).abs() < 1e-9);
    }
}
