use crate::error::StorageResult;
use crate::gateway::StorageGateway;
use crate::rows::OpportunityRow;
use crate::types::*;
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

fn f64_to_dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default()
}
fn opt_f64_to_dec(v: Option<f64>) -> Option<Decimal> {
    v.map(f64_to_dec)
}

/// Everything the scanner knows about one range/side at evaluation time,
/// regardless of whether it passed every filter. `filter_reason` is `None`
/// and `action` is `"entered"` only when the candidate cleared the chain.
pub struct NewOpportunity {
    pub city: String,
    pub target_date: NaiveDate,
    pub platform: Platform,
    pub market_id: String,
    pub range_name: String,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub range_type: RangeType,
    pub side: Side,
    pub ask: f64,
    pub bid: f64,
    pub spread: f64,
    pub volume: f64,
    pub forecast_temp: f64,
    pub ensemble_std_dev: f64,
    pub source_disagreement: f64,
    pub market_implied_mean: f64,
    pub market_divergence: f64,
    pub distance_to_near_edge: f64,
    pub distance_to_far_edge: Option<f64>,
    pub kelly_fraction: f64,
    pub raw_probability: f64,
    pub corrected_probability: f64,
    pub edge: f64,
    pub model_prob_bucket: i32,
    pub lead_time_bucket: i32,
    pub price_bucket: i32,
    pub filter_reason: Option<String>,
    pub action: String,
}

impl StorageGateway {
    pub async fn insert_opportunity(&self, o: NewOpportunity) -> StorageResult<Opportunity> {
        let row = sqlx::query_as::<_, OpportunityRow>(
            r#"
            INSERT INTO opportunities (
                city, target_date, platform, market_id, range_name, range_min, range_max,
                range_type, side, ask, bid, spread, volume, forecast_temp, ensemble_std_dev,
                source_disagreement, market_implied_mean, market_divergence,
                distance_to_near_edge, distance_to_far_edge, kelly_fraction,
                raw_probability, corrected_probability, edge,
                model_prob_bucket, lead_time_bucket, price_bucket, filter_reason, action
            ) VALUES (
                $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,
                $16,$17,$18,$19,$20,$21,$22,$23,$24,$25,$26,$27,$28,$29
            )
            RETURNING *
            "#,
        )
        .bind(&o.city)
        .bind(o.target_date)
        .bind(o.platform.as_str())
        .bind(&o.market_id)
        .bind(&o.range_name)
        .bind(opt_f64_to_dec(o.range_min))
        .bind(opt_f64_to_dec(o.range_max))
        .bind(match o.range_type {
            RangeType::Bounded => "bounded",
            RangeType::Unbounded => "unbounded",
        })
        .bind(match o.side {
            Side::Yes => "yes",
            Side::No => "no",
        })
        .bind(f64_to_dec(o.ask))
        .bind(f64_to_dec(o.bid))
        .bind(f64_to_dec(o.spread))
        .bind(f64_to_dec(o.volume))
        .bind(f64_to_dec(o.forecast_temp))
        .bind(f64_to_dec(o.ensemble_std_dev))
        .bind(f64_to_dec(o.source_disagreement))
        .bind(f64_to_dec(o.market_implied_mean))
        .bind(f64_to_dec(o.market_divergence))
        .bind(f64_to_dec(o.distance_to_near_edge))
        .bind(opt_f64_to_dec(o.distance_to_far_edge))
        .bind(f64_to_dec(o.kelly_fraction))
        .bind(f64_to_dec(o.raw_probability))
        .bind(f64_to_dec(o.corrected_probability))
        .bind(f64_to_dec(o.edge))
        .bind(o.model_prob_bucket)
        .bind(o.lead_time_bucket)
        .bind(o.price_bucket)
        .bind(&o.filter_reason)
        .bind(&o.action)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Backfill the outcome of every still-unresolved opportunity for a
    /// market once it settles, so `features_ml_mv` has ground truth for
    /// both entered and filtered-out candidates.
    pub async fn backfill_opportunity_outcomes(
        &self,
        market_id: &str,
        actual_temp: f64,
        winning_range: &str,
    ) -> StorageResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE opportunities SET
                actual_temp = $2,
                would_have_won = (range_name = $3)
            WHERE market_id = $1 AND actual_temp IS NULL
            "#,
        )
        .bind(market_id)
        .bind(f64_to_dec(actual_temp))
        .bind(winning_range)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Every backfilled opportunity (entered or filtered out) within the
    /// rolling calibration window -- the model/market calibration rebuild
    /// needs outcomes regardless of whether the candidate was ever traded.
    pub async fn fetch_resolved_opportunities_since(
        &self,
        since: NaiveDate,
    ) -> StorageResult<Vec<Opportunity>> {
        let rows = sqlx::query_as::<_, OpportunityRow>(
            "SELECT * FROM opportunities WHERE actual_temp IS NOT NULL AND target_date >= $1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Opportunity::from).collect())
    }

    pub async fn get_opportunities_for_city_date(
        &self,
        city: &str,
        target_date: NaiveDate,
    ) -> StorageResult<Vec<Opportunity>> {
        let rows = sqlx::query_as::<_, OpportunityRow>(
            "SELECT * FROM opportunities WHERE city = $1 AND target_date = $2 ORDER BY created_at",
        )
        .bind(city)
        .bind(target_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Opportunity::from).collect())
    }

    /// Flip a previously-entered opportunity to `executor_blocked` when the
    /// executor's own gates (bankroll, volume, dedup, sizing) reject it
    /// after the scanner already let it through -- required so calibration
    /// queries can tell "would have won but never got sized" apart from
    /// "filtered before it was ever a candidate".
    pub async fn mark_executor_blocked(&self, id: Uuid, reason: &str) -> StorageResult<()> {
        sqlx::query(
            "UPDATE opportunities SET action = 'executor_blocked', filter_reason = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_opportunity(&self, id: Uuid) -> StorageResult<Option<Opportunity>> {
        let row = sqlx::query_as::<_, OpportunityRow>("SELECT * FROM opportunities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Opportunity::from))
    }
}
