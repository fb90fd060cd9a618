use crate::error::StorageResult;
use crate::gateway::StorageGateway;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Restart-recoverable bookkeeping keyed by a short name, e.g. the
/// in-memory submitted-order set or the last completed cycle timestamp.
/// Never a source of truth for bankroll or position state -- those are
/// reconstructed every cycle from `trades` (spec.md §9).
impl StorageGateway {
    pub async fn save_state<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_value(value)?;
        sqlx::query(
            r#"
            INSERT INTO agent_state (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_state<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT value FROM agent_state WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((v,)) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }
}
