use crate::error::StorageResult;
use crate::gateway::StorageGateway;
use std::time::Instant;

const VIEWS: [&str; 3] = ["market_outcomes_mv", "features_ml_mv", "performance_mv"];

impl StorageGateway {
    /// Concurrently refresh every materialized view, logging duration and
    /// row count to `mv_refresh_log` for each. `CONCURRENTLY` requires the
    /// unique index created in `init_schema` and means readers never see a
    /// view go empty mid-refresh.
    pub async fn refresh_materialized_views(&self) -> StorageResult<()> {
        for view in VIEWS {
            self.refresh_one_view(view).await?;
        }
        Ok(())
    }

    async fn refresh_one_view(&self, view: &str) -> StorageResult<()> {
        let start = Instant::now();
        let sql = format!("REFRESH MATERIALIZED VIEW CONCURRENTLY {view}");
        sqlx::query(&sql).execute(&self.pool).await?;
        let duration_ms = start.elapsed().as_millis() as i64;

        let count_sql = format!("SELECT COUNT(*) FROM {view}");
        let row: (i64,) = sqlx::query_as(&count_sql).fetch_one(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO mv_refresh_log (view_name, duration_ms, row_count)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(view)
        .bind(duration_ms)
        .bind(row.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
