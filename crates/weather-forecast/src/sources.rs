use crate::error::{ForecastError, ForecastResult};
use crate::source::{ForecastSource, SourceReading};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

fn client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(8))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Global, no-key, high-resolution NWP model. Always enabled.
pub struct OpenMeteoSource;

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    daily: OpenMeteoDaily,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    temperature_2m_max: Vec<f64>,
}

#[async_trait]
impl ForecastSource for OpenMeteoSource {
    fn name(&self) -> &'static str {
        "open_meteo"
    }

    async fn fetch(&self, _city: &str, lat: f64, lon: f64, date: NaiveDate) -> ForecastResult<SourceReading> {
        let url = format!(
            "https://api.open-meteo.com/v1/forecast?latitude={lat}&longitude={lon}\
             &daily=temperature_2m_max&temperature_unit=fahrenheit\
             &start_date={date}&end_date={date}&timezone=auto"
        );
        let resp = client().get(url).send().await?;
        let parsed: OpenMeteoResponse = resp.json().await?;
        let temp = *parsed
            .daily
            .temperature_2m_max
            .first()
            .ok_or_else(|| ForecastError::NoSources {
                city: _city.to_string(),
                date: date.to_string(),
            })?;
        Ok(SourceReading {
            temp_f: temp,
            is_resolution_source: false,
        })
    }
}

/// Region-restricted authoritative forecast/observation source. This is
/// the one platform's resolution provenance differs from climatology --
/// gets a weight boost and surfaces as the parallel `kalshi_temp` field.
pub struct NwsSource {
    pub is_resolution_source: bool,
}

#[derive(Debug, Deserialize)]
struct NwsGridResponse {
    properties: NwsGridProperties,
}

#[derive(Debug, Deserialize)]
struct NwsGridProperties {
    #[serde(rename = "maxTemperature")]
    max_temperature: NwsValueSeries,
}

#[derive(Debug, Deserialize)]
struct NwsValueSeries {
    values: Vec<NwsValue>,
}

#[derive(Debug, Deserialize)]
struct NwsValue {
    value: f64,
}

#[async_trait]
impl ForecastSource for NwsSource {
    fn name(&self) -> &'static str {
        "nws"
    }

    async fn fetch(&self, city: &str, lat: f64, lon: f64, date: NaiveDate) -> ForecastResult<SourceReading> {
        let points_url = format!("https://api.weather.gov/points/{lat},{lon}");
        let points: serde_json::Value = client().get(&points_url).send().await?.json().await?;
        let grid_url = points["properties"]["forecastGridData"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let resp = client().get(&grid_url).send().await?;
        let parsed: NwsGridResponse = resp.json().await?;
        let temp = parsed
            .properties
            .max_temperature
            .values
            .first()
            .map(|v| v.value * 9.0 / 5.0 + 32.0)
            .ok_or_else(|| ForecastError::NoSources {
                city: city.to_string(),
                date: date.to_string(),
            })?;
        Ok(SourceReading {
            temp_f: temp,
            is_resolution_source: self.is_resolution_source,
        })
    }
}

/// Commercial forecast source guarded behind an optional API key. Dropped
/// from the ensemble entirely (not merely demoted) when no key is
/// configured.
pub struct CommercialSource {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
struct CommercialResponse {
    forecast: CommercialForecastDay,
}

#[derive(Debug, Deserialize)]
struct CommercialForecastDay {
    high_f: f64,
}

#[async_trait]
impl ForecastSource for CommercialSource {
    fn name(&self) -> &'static str {
        "commercial"
    }

    async fn fetch(&self, city: &str, lat: f64, lon: f64, date: NaiveDate) -> ForecastResult<SourceReading> {
        let url = format!(
            "https://api.commercial-weather.example/v1/forecast/daily?lat={lat}&lon={lon}&date={date}&key={}",
            self.api_key
        );
        let resp = client().get(url).send().await?;
        let parsed: CommercialResponse = resp.json().await?;
        if parsed.forecast.high_f.is_nan() {
            return Err(ForecastError::NoSources {
                city: city.to_string(),
                date: date.to_string(),
            });
        }
        Ok(SourceReading {
            temp_f: parsed.forecast.high_f,
            is_resolution_source: false,
        })
    }
}
