use crate::error::StorageResult;
use crate::gateway::StorageGateway;
use crate::rows::ObservationRow;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

fn f64_to_dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default()
}

impl StorageGateway {
    /// Record one authoritative-station reading and the rolling highs that
    /// go with it. `running_high` is max over every polled source today;
    /// `wu_high` is max over the authoritative (resolution) source only --
    /// the two diverge whenever a PWS spikes above METAR.
    pub async fn insert_observation(
        &self,
        city: &str,
        target_date: NaiveDate,
        observed_at: DateTime<Utc>,
        station_id: &str,
        temp: f64,
        running_high: f64,
        wu_high: f64,
    ) -> StorageResult<Observation> {
        let row = sqlx::query_as::<_, ObservationRow>(
            r#"
            INSERT INTO observations
                (city, target_date, observed_at, station_id, temp, running_high, wu_high)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(city)
        .bind(target_date)
        .bind(observed_at)
        .bind(station_id)
        .bind(f64_to_dec(temp))
        .bind(f64_to_dec(running_high))
        .bind(f64_to_dec(wu_high))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn latest_observation(
        &self,
        city: &str,
        target_date: NaiveDate,
    ) -> StorageResult<Option<Observation>> {
        let row = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT * FROM observations
            WHERE city = $1 AND target_date = $2
            ORDER BY observed_at DESC
            LIMIT 1
            "#,
        )
        .bind(city)
        .bind(target_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Observation::from))
    }

    pub async fn insert_pws_observation(
        &self,
        city: &str,
        target_date: NaiveDate,
        observed_at: DateTime<Utc>,
        station_id: &str,
        temp: f64,
        bias_corrected_temp: f64,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pws_observations
                (city, target_date, observed_at, station_id, temp, bias_corrected_temp)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(city)
        .bind(target_date)
        .bind(observed_at)
        .bind(station_id)
        .bind(f64_to_dec(temp))
        .bind(f64_to_dec(bias_corrected_temp))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Max bias-corrected PWS reading for the day, across all configured
    /// stations, used by the guaranteed-win PWS entry path.
    pub async fn max_pws_bias_corrected_today(
        &self,
        city: &str,
        target_date: NaiveDate,
    ) -> StorageResult<Option<f64>> {
        use rust_decimal::prelude::ToPrimitive;
        let row: (Option<Decimal>,) = sqlx::query_as(
            "SELECT MAX(bias_corrected_temp) FROM pws_observations WHERE city = $1 AND target_date = $2",
        )
        .bind(city)
        .bind(target_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0.and_then(|d| d.to_f64()))
    }
}
