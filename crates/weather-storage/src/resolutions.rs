use crate::error::StorageResult;
use crate::gateway::StorageGateway;
use crate::rows::MarketResolutionRow;
use crate::types::*;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

fn f64_to_dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default()
}

impl StorageGateway {
    /// Upsert the canonical outcome for a market. Idempotent: re-running
    /// the resolver against an already-settled market is a no-op write,
    /// never a second resolution event.
    pub async fn upsert_market_resolution(
        &self,
        market_id: &str,
        platform: Platform,
        actual_temp: f64,
        winning_range: &str,
        resolved_at: DateTime<Utc>,
        resolution_station: &str,
    ) -> StorageResult<MarketResolution> {
        let row = sqlx::query_as::<_, MarketResolutionRow>(
            r#"
            INSERT INTO market_resolutions
                (market_id, platform, actual_temp, winning_range, resolved_at, resolution_station)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (market_id) DO UPDATE SET
                actual_temp = EXCLUDED.actual_temp,
                winning_range = EXCLUDED.winning_range,
                resolved_at = EXCLUDED.resolved_at,
                resolution_station = EXCLUDED.resolution_station
            RETURNING *
            "#,
        )
        .bind(market_id)
        .bind(platform.as_str())
        .bind(f64_to_dec(actual_temp))
        .bind(winning_range)
        .bind(resolved_at)
        .bind(resolution_station)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn get_market_resolution(
        &self,
        market_id: &str,
    ) -> StorageResult<Option<MarketResolution>> {
        let row = sqlx::query_as::<_, MarketResolutionRow>(
            "SELECT * FROM market_resolutions WHERE market_id = $1",
        )
        .bind(market_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(MarketResolution::from))
    }

    /// Append one forecast-source accuracy sample. `model_valid = false`
    /// marks a sample that should be excluded from MAE recomputation
    /// (demoted/disabled source at the time of forecast), never deleted so
    /// the audit trail stays intact.
    pub async fn record_accuracy_sample(
        &self,
        city: &str,
        source: &str,
        target_date: chrono::NaiveDate,
        forecast_temp: f64,
        actual_temp: f64,
        model_valid: bool,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accuracy_log
                (city, source, target_date, forecast_temp, actual_temp, signed_error, model_valid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(city)
        .bind(source)
        .bind(target_date)
        .bind(f64_to_dec(forecast_temp))
        .bind(f64_to_dec(actual_temp))
        .bind(f64_to_dec(forecast_temp - actual_temp))
        .bind(model_valid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Signed errors of the corrected ensemble ("ensemble" source) per city
    /// within the rolling calibration window, feeding the city-error
    /// percentile rebuild.
    pub async fn fetch_ensemble_errors_since(
        &self,
        since: chrono::NaiveDate,
    ) -> StorageResult<Vec<(String, f64)>> {
        use rust_decimal::prelude::ToPrimitive;
        #[derive(sqlx::FromRow)]
        struct Row {
            city: String,
            signed_error: Decimal,
        }
        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT city, signed_error FROM accuracy_log
            WHERE source = 'ensemble' AND model_valid = TRUE AND target_date >= $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.city, r.signed_error.to_f64().unwrap_or(0.0)))
            .collect())
    }

    /// Mean absolute error for one source over its last `n` valid samples.
    /// Only rows with `model_valid = TRUE` feed the demotion decision, so a
    /// source already demoted for bad data doesn't get re-demoted on the
    /// error it was demoted for (spec.md §9).
    pub async fn source_mae(&self, city: &str, source: &str, n: i64) -> StorageResult<Option<f64>> {
        use rust_decimal::prelude::ToPrimitive;
        let row: (Option<Decimal>,) = sqlx::query_as(
            r#"
            SELECT AVG(ABS(signed_error)) FROM (
                SELECT signed_error FROM accuracy_log
                WHERE city = $1 AND source = $2 AND model_valid = TRUE
                ORDER BY created_at DESC
                LIMIT $3
            ) sub
            "#,
        )
        .bind(city)
        .bind(source)
        .bind(n)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0.and_then(|d| d.to_f64()))
    }
}
