use crate::error::ResolverResult;
use weather_storage::{StorageGateway, Trade};

/// Record one accuracy sample per forecast source plus the corrected
/// ensemble itself, so `source_mae` (demotion) and the corrected-ensemble
/// error distribution both stay current off the same resolved trade.
pub async fn record_trade_accuracy(
    storage: &StorageGateway,
    trade: &Trade,
    actual_temp: f64,
) -> ResolverResult<()> {
    if let serde_json::Value::Object(map) = &trade.ensemble_breakdown {
        for (source, reading) in map {
            let Some(temp) = reading.get("temp").and_then(|v| v.as_f64()) else { continue };
            storage
                .record_accuracy_sample(&trade.city, source, trade.target_date, temp, actual_temp, true)
                .await?;
        }
    }
    storage
        .record_accuracy_sample(
            &trade.city,
            "ensemble",
            trade.target_date,
            trade.forecast_temp,
            actual_temp,
            true,
        )
        .await?;
    Ok(())
}
