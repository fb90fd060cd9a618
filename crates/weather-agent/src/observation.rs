//! Ground-observation polling for the fast paths: authoritative (METAR)
//! station readings feed the running-high the scanner's
//! `observation_boundary` gate and the monitor's exit signals read, while
//! nearby personal weather stations (PWS) feed the corrected-median spike
//! detector in `fastpath`. Mirrors `weather_forecast::source`'s one-API,
//! one-timeout pattern rather than introducing a second HTTP style.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("station {0} returned no current reading")]
    NoReading(String),
}

pub type ObservationResult<T> = Result<T, ObservationError>;

fn client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new())
}

/// One station's current reading, already in the city's trading unit.
#[derive(Debug, Clone, Copy)]
pub struct StationReading {
    pub temp: f64,
}

#[async_trait]
pub trait ObservationSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, station_id: &str) -> ObservationResult<StationReading>;
}

#[derive(Deserialize)]
struct MetarResponse {
    data: Vec<MetarDatum>,
}

#[derive(Deserialize)]
struct MetarDatum {
    #[serde(rename = "temp")]
    temp_c: f64,
}

/// NWS/METAR hourly observation for a station -- the same station the
/// platform resolves against, so this is the source the scanner's
/// `observation_boundary` gate and the monitor's running-high tracking
/// trust as authoritative.
pub struct MetarObservationSource;

#[async_trait]
impl ObservationSource for MetarObservationSource {
    fn name(&self) -> &'static str {
        "metar"
    }

    async fn fetch(&self, station_id: &str) -> ObservationResult<StationReading> {
        let url = format!("https://api.weather.gov/stations/{station_id}/observations/latest");
        let resp = client(Duration::from_secs(5)).get(&url).send().await?;
        let parsed: serde_json::Value = resp.json().await?;
        let temp_c = parsed["properties"]["temperature"]["value"]
            .as_f64()
            .ok_or_else(|| ObservationError::NoReading(station_id.to_string()))?;
        Ok(StationReading { temp: temp_c * 9.0 / 5.0 + 32.0 })
    }
}

/// One nearby personal weather station. Bias correction against that
/// station's historical divergence from the authoritative reading is a
/// documented open question (see DESIGN.md) resolved here as a pass-through
/// -- no bias model is sampled from yet, so the raw reading is what gets
/// fed into the corrected-median.
pub struct PwsObservationSource;

#[async_trait]
impl ObservationSource for PwsObservationSource {
    fn name(&self) -> &'static str {
        "pws"
    }

    async fn fetch(&self, station_id: &str) -> ObservationResult<StationReading> {
        let url = format!("https://api.weather.com/v2/pws/observations/current?stationId={station_id}&format=json&units=e");
        let resp = client(Duration::from_secs(5)).get(&url).send().await?;
        let parsed: serde_json::Value = resp.json().await?;
        let temp_f = parsed["observations"][0]["imperial"]["temp"]
            .as_f64()
            .ok_or_else(|| ObservationError::NoReading(station_id.to_string()))?;
        Ok(StationReading { temp: temp_f })
    }
}

/// True median of the three PWS readings -- with an odd count the outlier
/// never survives into the result, unlike a weighted mean where one bad
/// station can still pull the estimate.
pub fn corrected_median(mut readings: Vec<f64>) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }
    readings.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = readings.len() / 2;
    Some(if readings.len() % 2 == 0 {
        (readings[mid - 1] + readings[mid]) / 2.0
    } else {
        readings[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_three_discards_the_outlier() {
        let median = corrected_median(vec![50.0, 51.0, 90.0]).unwrap();
        assert_eq!(median, 51.0);
    }

    #[test]
    fn median_of_empty_is_none() {
        assert_eq!(corrected_median(vec![]), None);
    }

    #[test]
    fn median_of_even_count_averages_the_middle_pair() {
        let median = corrected_median(vec![50.0, 52.0]).unwrap();
        assert_eq!(median, 51.0);
    }
}
