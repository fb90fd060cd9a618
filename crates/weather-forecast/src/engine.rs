use crate::ensemble::{compute_ensemble, weighted_breakdown};
use crate::error::ForecastResult;
use crate::probability::{model_prob_bucket, probability_with_calibration};
use crate::source::{ForecastSource, SourceReading};
use crate::weighting::{build_weights, SourceMae};
use chrono::NaiveDate;
use weather_config::{CalibrationConfig, ForecastSourceConfig};
use weather_storage::{RangeType, StorageGateway};

/// Output of one forecast pass for a (city, date). `low_confidence` is set
/// when fewer than `min_active_sources` remained after demotion -- the
/// scanner must treat the city as ineligible that cycle rather than trade
/// on a degraded ensemble.
pub struct ForecastOutput {
    pub mean: f64,
    pub std_dev: f64,
    pub source_disagreement: f64,
    pub kalshi_temp: Option<f64>,
    pub ensemble_breakdown: serde_json::Value,
    pub low_confidence: bool,
}

pub struct ForecastEngine {
    sources: Vec<Box<dyn ForecastSource>>,
}

impl ForecastEngine {
    pub fn new(sources: Vec<Box<dyn ForecastSource>>) -> Self {
        Self { sources }
    }

    pub async fn forecast(
        &self,
        storage: &StorageGateway,
        city: &str,
        lat: f64,
        lon: f64,
        unit_is_celsius: bool,
        target_date: NaiveDate,
        days_out: f64,
        is_dual_station: bool,
        cfg: &ForecastSourceConfig,
    ) -> ForecastResult<ForecastOutput> {
        let mut maes = Vec::new();
        let mut readings: Vec<(&'static str, SourceReading)> = Vec::new();

        for source in &self.sources {
            match source.fetch(city, lat, lon, target_date).await {
                Ok(reading) => {
                    let mae = storage
                        .source_mae(city, source.name(), 30)
                        .await
                        .ok()
                        .flatten()
                        .unwrap_or(2.0);
                    maes.push(SourceMae {
                        name: source.name(),
                        mae,
                        is_resolution_source: reading.is_resolution_source,
                    });
                    readings.push((source.name(), reading));
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "forecast source failed, dropping from ensemble");
                }
            }
        }

        let weights = build_weights(&maes, cfg, unit_is_celsius);
        let active = weights.iter().filter(|w| w.weight > 0.0).count();
        let low_confidence = active < cfg.min_active_sources || readings.is_empty();

        let weighted_readings: Vec<(f64, f64)> = readings
            .iter()
            .map(|(name, reading)| {
                let weight = weights.iter().find(|w| w.name == *name).map(|w| w.weight).unwrap_or(0.0);
                (reading.temp_f, weight)
            })
            .collect();

        let kalshi_temp = readings
            .iter()
            .find(|(_, r)| r.is_resolution_source)
            .map(|(_, r)| r.temp_f);

        let empirical_std_dev = storage
            .get_city_error_distribution(city)
            .await
            .ok()
            .flatten()
            .map(|d| d.std_dev_error);

        let ensemble = compute_ensemble(&weighted_readings, kalshi_temp, empirical_std_dev, days_out, is_dual_station);

        let breakdown_source: Vec<(&'static str, f64)> = readings.iter().map(|(n, r)| (*n, r.temp_f)).collect();
        let ensemble_breakdown = weighted_breakdown(&breakdown_source, &weights);

        Ok(ForecastOutput {
            mean: ensemble.mean,
            std_dev: ensemble.std_dev,
            source_disagreement: ensemble.source_disagreement,
            kalshi_temp: ensemble.kalshi_temp,
            ensemble_breakdown,
            low_confidence,
        })
    }
}

/// Convenience wrapper combining the forecast pass with calibration
/// correction for one specific range, so callers don't have to juggle the
/// calibration lookup themselves.
pub async fn probability_for_range(
    storage: &StorageGateway,
    range_type: RangeType,
    rmin: Option<f64>,
    rmax: Option<f64>,
    mean: f64,
    std_dev: f64,
    cal_cfg: &CalibrationConfig,
) -> ForecastResult<(f64, f64, i32)> {
    let raw_probability = weather_numerics::range_probability(rmin, rmax, mean, std_dev);
    let bucket_idx = model_prob_bucket(raw_probability);
    let bucket = storage.lookup_model_calibration(range_type, bucket_idx).await?;
    let result = probability_with_calibration(rmin, rmax, mean, std_dev, bucket.as_ref(), cal_cfg);
    Ok((result.raw_probability, result.corrected_probability, bucket_idx))
}
