use crate::cache::TtlCache;
use crate::client::{PlatformClient, ResolutionDescriptor, ResolutionMethod};
use crate::error::{PlatformError, PlatformResult};
use crate::parse_range::parse_range;
use crate::types::Market;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use weather_storage::Platform;

const BASE_URL: &str = "https://trading-api.kalshi.com/trade-api/v2";
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct MarketsPage {
    markets: Vec<RawMarket>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    ticker: String,
    subtitle: String,
    close_time: String,
    #[serde(default)]
    yes_ask: f64,
    #[serde(default)]
    yes_bid: f64,
    #[serde(default)]
    no_ask: f64,
    #[serde(default)]
    no_bid: f64,
    #[serde(default)]
    volume: f64,
}

pub struct KalshiClient {
    client: Client,
    api_key: Option<String>,
    private_key_pem: Option<String>,
    cache: TtlCache<Vec<Market>>,
}

impl KalshiClient {
    pub fn new(api_key: Option<String>, private_key_pem: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            private_key_pem,
            cache: TtlCache::new(Duration::from_secs(120)),
        }
    }

    /// Kalshi requests are signed with the account's private key; signing
    /// is out of scope here beyond carrying the key material through to
    /// wherever the real signer lives.
    fn is_authenticated(&self) -> bool {
        self.api_key.is_some() && self.private_key_pem.is_some()
    }

    async fn fetch_page(
        &self,
        series_ticker: &str,
        cursor: Option<&str>,
    ) -> PlatformResult<MarketsPage> {
        let mut req = self
            .client
            .get(format!("{BASE_URL}/markets"))
            .query(&[("series_ticker", series_ticker), ("status", "open")]);
        if let Some(c) = cursor {
            req = req.query(&[("cursor", c)]);
        }
        if let Some(key) = &self.api_key {
            req = req.header("KALSHI-ACCESS-KEY", key);
        }
        let resp = req.send().await?;
        let page: MarketsPage = resp.json().await?;
        Ok(page)
    }
}

#[async_trait]
impl PlatformClient for KalshiClient {
    fn platform(&self) -> Platform {
        Platform::Kalshi
    }

    async fn fetch_markets(
        &self,
        city: &str,
        station_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PlatformResult<Vec<Market>> {
        let cache_key = format!("{city}|{from}|{to}");
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let series_ticker = format!("KXHIGH{station_id}");
        let mut markets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = self.fetch_page(&series_ticker, cursor.as_deref()).await?;
            for raw in page.markets {
                let target_date = match NaiveDate::parse_from_str(&raw.close_time[..10], "%Y-%m-%d")
                {
                    Ok(d) => d,
                    Err(_) => continue,
                };
                if target_date < from || target_date > to {
                    continue;
                }
                let parsed = match parse_range(&raw.subtitle) {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                markets.push(Market {
                    platform: Platform::Kalshi,
                    market_id: raw.ticker,
                    city: city.to_string(),
                    target_date,
                    range_name: raw.subtitle,
                    range_min: parsed.min,
                    range_max: parsed.max,
                    range_type: parsed.range_type,
                    yes_ask: raw.yes_ask,
                    yes_bid: raw.yes_bid,
                    no_ask: raw.no_ask,
                    no_bid: raw.no_bid,
                    volume: raw.volume,
                });
            }
            pages += 1;
            match page.cursor {
                Some(c) if !c.is_empty() => {
                    if pages >= MAX_PAGES {
                        return Err(PlatformError::PaginationTruncated(pages));
                    }
                    cursor = Some(c);
                }
                _ => break,
            }
        }

        self.cache.insert(cache_key, markets.clone());
        Ok(markets)
    }

    fn resolution_descriptor(&self, station_id: &str) -> ResolutionDescriptor {
        ResolutionDescriptor {
            station_id: station_id.to_string(),
            method: ResolutionMethod::HistoricalHourlyObservations {
                has_max_temp_field: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_client_reports_not_authenticated() {
        let c = KalshiClient::new(None, None);
        assert!(!c.is_authenticated());
    }

    #[test]
    fn authenticated_client_requires_both_key_and_pem() {
        let c = KalshiClient::new(Some("k".to_string()), None);
        assert!(!c.is_authenticated());
        let c = KalshiClient::new(Some("k".to_string()), Some("pem".to_string()));
        assert!(c.is_authenticated());
    }
}
