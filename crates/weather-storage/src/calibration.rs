use crate::error::StorageResult;
use crate::gateway::StorageGateway;
use crate::rows::{MarketCalibrationRow, ModelCalibrationRow};
use crate::types::*;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

fn f64_to_dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default()
}

/// One freshly-computed model-calibration bucket, ready to overwrite the
/// table. `correction_ratio = actual_win_rate / avg_model_prob`, capped by
/// the caller (weather-forecast) before the write lands here.
pub struct ModelCalibrationInput {
    pub range_type: RangeType,
    pub model_prob_bucket: i32,
    pub n: i64,
    pub avg_model_prob: f64,
    pub actual_win_rate: f64,
    pub correction_ratio: f64,
}

pub struct MarketCalibrationInput {
    pub platform: Platform,
    pub range_type: RangeType,
    pub lead_time_bucket: i32,
    pub price_bucket: i32,
    pub n: i64,
    pub empirical_win_rate: f64,
    pub market_avg_ask: f64,
    pub true_edge: f64,
}

impl StorageGateway {
    /// Rebuild the entire model-calibration table from a rolling window.
    /// Runs inside one transaction: callers never observe a half-rebuilt
    /// table. Grounded on `analytics`'s periodic-recompute-and-swap style
    /// rather than incremental bucket updates, because bucket boundaries
    /// can shift between rebuilds.
    pub async fn rebuild_model_calibration(
        &self,
        buckets: Vec<ModelCalibrationInput>,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE model_calibration").execute(&mut *tx).await?;
        for b in buckets {
            sqlx::query(
                r#"
                INSERT INTO model_calibration
                    (range_type, model_prob_bucket, n, avg_model_prob, actual_win_rate, correction_ratio)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(match b.range_type {
                RangeType::Bounded => "bounded",
                RangeType::Unbounded => "unbounded",
            })
            .bind(b.model_prob_bucket)
            .bind(b.n)
            .bind(f64_to_dec(b.avg_model_prob))
            .bind(f64_to_dec(b.actual_win_rate))
            .bind(f64_to_dec(b.correction_ratio))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn rebuild_market_calibration(
        &self,
        buckets: Vec<MarketCalibrationInput>,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE market_calibration").execute(&mut *tx).await?;
        for b in buckets {
            sqlx::query(
                r#"
                INSERT INTO market_calibration
                    (platform, range_type, lead_time_bucket, price_bucket, n,
                     empirical_win_rate, market_avg_ask, true_edge)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(b.platform.as_str())
            .bind(match b.range_type {
                RangeType::Bounded => "bounded",
                RangeType::Unbounded => "unbounded",
            })
            .bind(b.lead_time_bucket)
            .bind(b.price_bucket)
            .bind(b.n)
            .bind(f64_to_dec(b.empirical_win_rate))
            .bind(f64_to_dec(b.market_avg_ask))
            .bind(f64_to_dec(b.true_edge))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn rebuild_city_error_distribution(
        &self,
        dists: Vec<CityErrorDistribution>,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE city_error_distribution").execute(&mut *tx).await?;
        for d in dists {
            sqlx::query(
                r#"
                INSERT INTO city_error_distribution
                    (city, n, mean_error, std_dev_error, p5, p25, p50, p75, p95)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&d.city)
            .bind(d.n)
            .bind(f64_to_dec(d.mean_error))
            .bind(f64_to_dec(d.std_dev_error))
            .bind(f64_to_dec(d.p5))
            .bind(f64_to_dec(d.p25))
            .bind(f64_to_dec(d.p50))
            .bind(f64_to_dec(d.p75))
            .bind(f64_to_dec(d.p95))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn lookup_model_calibration(
        &self,
        range_type: RangeType,
        model_prob_bucket: i32,
    ) -> StorageResult<Option<ModelCalibrationBucket>> {
        let row = sqlx::query_as::<_, ModelCalibrationRow>(
            "SELECT * FROM model_calibration WHERE range_type = $1 AND model_prob_bucket = $2",
        )
        .bind(match range_type {
            RangeType::Bounded => "bounded",
            RangeType::Unbounded => "unbounded",
        })
        .bind(model_prob_bucket)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ModelCalibrationBucket::from))
    }

    pub async fn lookup_market_calibration(
        &self,
        platform: Platform,
        range_type: RangeType,
        lead_time_bucket: i32,
        price_bucket: i32,
    ) -> StorageResult<Option<MarketCalibrationBucket>> {
        let row = sqlx::query_as::<_, MarketCalibrationRow>(
            r#"
            SELECT * FROM market_calibration
            WHERE platform = $1 AND range_type = $2 AND lead_time_bucket = $3 AND price_bucket = $4
            "#,
        )
        .bind(platform.as_str())
        .bind(match range_type {
            RangeType::Bounded => "bounded",
            RangeType::Unbounded => "unbounded",
        })
        .bind(lead_time_bucket)
        .bind(price_bucket)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(MarketCalibrationBucket::from))
    }

    pub async fn get_city_error_distribution(
        &self,
        city: &str,
    ) -> StorageResult<Option<CityErrorDistribution>> {
        use rust_decimal::prelude::ToPrimitive;
        #[derive(sqlx::FromRow)]
        struct Row {
            city: String,
            n: i64,
            mean_error: Decimal,
            std_dev_error: Decimal,
            p5: Decimal,
            p25: Decimal,
            p50: Decimal,
            p75: Decimal,
            p95: Decimal,
        }
        let row = sqlx::query_as::<_, Row>("SELECT * FROM city_error_distribution WHERE city = $1")
            .bind(city)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| CityErrorDistribution {
            city: r.city,
            n: r.n,
            mean_error: r.mean_error.to_f64().unwrap_or(0.0),
            std_dev_error: r.std_dev_error.to_f64().unwrap_or(0.0),
            p5: r.p5.to_f64().unwrap_or(0.0),
            p25: r.p25.to_f64().unwrap_or(0.0),
            p50: r.p50.to_f64().unwrap_or(0.0),
            p75: r.p75.to_f64().unwrap_or(0.0),
            p95: r.p95.to_f64().unwrap_or(0.0),
        }))
    }
}
