use crate::error::StorageResult;
use sqlx::PgPool;

/// Typed access to the relational store. Every public method here is one
/// transactional unit at statement granularity; multi-statement operations
/// (resolver backfills, calibration rebuilds) open their own transaction
/// internally rather than leaking a shared one across calls.
#[derive(Clone)]
pub struct StorageGateway {
    pub(crate) pool: PgPool,
}

impl StorageGateway {
    pub async fn connect(database_url: &str, max_connections: u32) -> StorageResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Idempotent schema creation. Mirrors `StateManager::init_tables` /
    /// `RiskManager::init_circuit_breaker_tables`: explicit `CREATE TABLE IF
    /// NOT EXISTS` rather than an ORM migration runner, so the schema is
    /// visible at the call site instead of buried in migration files.
    pub async fn init_schema(&self) -> StorageResult<()> {
        sqlx::raw_sql(
            r#"
            CREATE EXTENSION IF NOT EXISTS pgcrypto;

            CREATE TABLE IF NOT EXISTS trades (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                city TEXT NOT NULL,
                target_date DATE NOT NULL,
                platform TEXT NOT NULL,
                market_id TEXT NOT NULL,
                range_name TEXT NOT NULL,
                range_min NUMERIC,
                range_max NUMERIC,
                range_type TEXT NOT NULL,
                side TEXT NOT NULL,
                unit TEXT NOT NULL,
                entry_ask NUMERIC NOT NULL,
                entry_bid NUMERIC NOT NULL,
                entry_spread NUMERIC NOT NULL,
                entry_volume NUMERIC NOT NULL,
                forecast_temp NUMERIC NOT NULL,
                forecast_confidence NUMERIC NOT NULL,
                forecast_std_dev NUMERIC NOT NULL,
                ensemble_breakdown JSONB NOT NULL DEFAULT '{}'::jsonb,
                edge NUMERIC NOT NULL,
                kelly_fraction NUMERIC NOT NULL,
                entry_reason TEXT NOT NULL,
                shares NUMERIC NOT NULL,
                cost NUMERIC NOT NULL,
                entry_fee NUMERIC NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'open',
                actual_temp NUMERIC,
                won BOOLEAN,
                pnl NUMERIC,
                fees NUMERIC,
                resolved_at TIMESTAMPTZ,
                resolution_station TEXT,
                exit_reason TEXT,
                exit_time TIMESTAMPTZ,
                exit_price NUMERIC,
                observation_high NUMERIC,
                wu_high NUMERIC,
                max_price_seen NUMERIC,
                min_probability_seen NUMERIC,
                evaluator_log JSONB NOT NULL DEFAULT '[]'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_trades_status_platform ON trades (status, platform);
            CREATE INDEX IF NOT EXISTS idx_trades_platform_date ON trades (platform, target_date);
            CREATE INDEX IF NOT EXISTS idx_trades_dedup ON trades (city, target_date, range_name, side);

            CREATE TABLE IF NOT EXISTS opportunities (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                city TEXT NOT NULL,
                target_date DATE NOT NULL,
                platform TEXT NOT NULL,
                market_id TEXT NOT NULL,
                range_name TEXT NOT NULL,
                range_min NUMERIC,
                range_max NUMERIC,
                range_type TEXT NOT NULL,
                side TEXT NOT NULL,
                ask NUMERIC NOT NULL,
                bid NUMERIC NOT NULL,
                spread NUMERIC NOT NULL,
                volume NUMERIC NOT NULL,
                forecast_temp NUMERIC NOT NULL,
                ensemble_std_dev NUMERIC NOT NULL,
                source_disagreement NUMERIC NOT NULL,
                market_implied_mean NUMERIC NOT NULL,
                market_divergence NUMERIC NOT NULL,
                distance_to_near_edge NUMERIC NOT NULL,
                distance_to_far_edge NUMERIC,
                kelly_fraction NUMERIC NOT NULL,
                raw_probability NUMERIC NOT NULL,
                corrected_probability NUMERIC NOT NULL,
                edge NUMERIC NOT NULL,
                model_prob_bucket INT NOT NULL,
                lead_time_bucket INT NOT NULL,
                price_bucket INT NOT NULL,
                filter_reason TEXT,
                action TEXT NOT NULL,
                actual_temp NUMERIC,
                would_have_won BOOLEAN,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_opps_city_date ON opportunities (city, target_date);
            CREATE INDEX IF NOT EXISTS idx_opps_created_at ON opportunities (created_at);
            CREATE INDEX IF NOT EXISTS idx_opps_market_id ON opportunities (market_id);

            CREATE TABLE IF NOT EXISTS market_resolutions (
                market_id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                actual_temp NUMERIC NOT NULL,
                winning_range TEXT NOT NULL,
                resolved_at TIMESTAMPTZ NOT NULL,
                resolution_station TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS observations (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                city TEXT NOT NULL,
                target_date DATE NOT NULL,
                observed_at TIMESTAMPTZ NOT NULL,
                station_id TEXT NOT NULL,
                temp NUMERIC NOT NULL,
                running_high NUMERIC NOT NULL,
                wu_high NUMERIC NOT NULL,
                observation_count BIGINT NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_observations_city_date ON observations (city, target_date, observed_at DESC);

            CREATE TABLE IF NOT EXISTS pws_observations (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                city TEXT NOT NULL,
                target_date DATE NOT NULL,
                observed_at TIMESTAMPTZ NOT NULL,
                station_id TEXT NOT NULL,
                temp NUMERIC NOT NULL,
                bias_corrected_temp NUMERIC NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_pws_city_date ON pws_observations (city, target_date, observed_at DESC);

            CREATE TABLE IF NOT EXISTS model_calibration (
                range_type TEXT NOT NULL,
                model_prob_bucket INT NOT NULL,
                n BIGINT NOT NULL,
                avg_model_prob NUMERIC NOT NULL,
                actual_win_rate NUMERIC NOT NULL,
                correction_ratio NUMERIC NOT NULL,
                PRIMARY KEY (range_type, model_prob_bucket)
            );

            CREATE TABLE IF NOT EXISTS market_calibration (
                platform TEXT NOT NULL,
                range_type TEXT NOT NULL,
                lead_time_bucket INT NOT NULL,
                price_bucket INT NOT NULL,
                n BIGINT NOT NULL,
                empirical_win_rate NUMERIC NOT NULL,
                market_avg_ask NUMERIC NOT NULL,
                true_edge NUMERIC NOT NULL,
                PRIMARY KEY (platform, range_type, lead_time_bucket, price_bucket)
            );

            CREATE TABLE IF NOT EXISTS city_error_distribution (
                city TEXT PRIMARY KEY,
                n BIGINT NOT NULL,
                mean_error NUMERIC NOT NULL,
                std_dev_error NUMERIC NOT NULL,
                p5 NUMERIC NOT NULL,
                p25 NUMERIC NOT NULL,
                p50 NUMERIC NOT NULL,
                p75 NUMERIC NOT NULL,
                p95 NUMERIC NOT NULL
            );

            CREATE TABLE IF NOT EXISTS accuracy_log (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                city TEXT NOT NULL,
                source TEXT NOT NULL,
                target_date DATE NOT NULL,
                forecast_temp NUMERIC NOT NULL,
                actual_temp NUMERIC NOT NULL,
                signed_error NUMERIC NOT NULL,
                model_valid BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_accuracy_city_source ON accuracy_log (city, source, created_at);

            CREATE TABLE IF NOT EXISTS mv_refresh_log (
                id BIGSERIAL PRIMARY KEY,
                view_name TEXT NOT NULL,
                refreshed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                duration_ms BIGINT NOT NULL,
                row_count BIGINT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agent_state (
                key TEXT PRIMARY KEY,
                value JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        self.init_materialized_views().await?;
        Ok(())
    }

    async fn init_materialized_views(&self) -> StorageResult<()> {
        sqlx::raw_sql(
            r#"
            CREATE MATERIALIZED VIEW IF NOT EXISTS market_outcomes_mv AS
            SELECT DISTINCT ON (o.market_id)
                o.market_id, o.city, o.target_date, o.platform, o.range_name,
                o.corrected_probability, o.edge, r.actual_temp, r.winning_range, r.resolved_at
            FROM opportunities o
            JOIN market_resolutions r ON r.market_id = o.market_id
            ORDER BY o.market_id, o.created_at DESC;

            CREATE UNIQUE INDEX IF NOT EXISTS idx_market_outcomes_mv_market_id
                ON market_outcomes_mv (market_id);

            CREATE MATERIALIZED VIEW IF NOT EXISTS features_ml_mv AS
            SELECT o.*
            FROM opportunities o
            JOIN market_resolutions r ON r.market_id = o.market_id
            WHERE o.side = 'yes' AND o.would_have_won = TRUE;

            CREATE MATERIALIZED VIEW IF NOT EXISTS performance_mv AS
            SELECT t.city, t.platform, t.range_type, t.status,
                   COUNT(*) AS n,
                   SUM(CASE WHEN t.won THEN 1 ELSE 0 END) AS wins,
                   SUM(COALESCE(t.pnl, 0)) AS total_pnl
            FROM trades t
            GROUP BY t.city, t.platform, t.range_type, t.status;
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
