use crate::error::ForecastResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

/// One forecast source's raw reading for a (city, date) pair. `is_resolution_source`
/// marks the source whose station the market actually settles against --
/// it gets a weight boost and is also surfaced separately as `kalshi_temp`
/// so the scanner can choose per-range.
#[derive(Debug, Clone, Copy)]
pub struct SourceReading {
    pub temp_f: f64,
    pub is_resolution_source: bool,
}

/// A named forecast input. Implementations call out to one HTTP API with
/// a per-call timeout; the ensemble never blocks longer than that on a
/// slow or dead source.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn timeout(&self) -> Duration {
        Duration::from_secs(8)
    }
    async fn fetch(&self, city: &str, lat: f64, lon: f64, date: NaiveDate) -> ForecastResult<SourceReading>;
}
