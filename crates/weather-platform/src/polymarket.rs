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

const BASE_URL: &str = "https://gamma-api.polymarket.com";
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct MarketsPage {
    data: Vec<RawMarket>,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    condition_id: String,
    question: String,
    end_date: String,
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

pub struct PolymarketClient {
    client: Client,
    api_key: Option<String>,
    cache: TtlCache<Vec<Market>>,
}

impl PolymarketClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            cache: TtlCache::new(Duration::from_secs(120)),
        }
    }

    async fn fetch_page(&self, city: &str, cursor: Option<&str>) -> PlatformResult<MarketsPage> {
        let mut req = self
            .client
            .get(format!("{BASE_URL}/markets"))
            .query(&[("tag", "weather"), ("series", city)]);
        if let Some(c) = cursor {
            req = req.query(&[("next_cursor", c)]);
        }
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        let page: MarketsPage = resp.json().await?;
        Ok(page)
    }
}

#[async_trait]
impl PlatformClient for PolymarketClient {
    fn platform(&self) -> Platform {
        Platform::Polymarket
    }

    async fn fetch_markets(
        &self,
        city: &str,
        _station_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PlatformResult<Vec<Market>> {
        let cache_key = format!("{city}|{from}|{to}");
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let mut markets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = self.fetch_page(city, cursor.as_deref()).await?;
            for raw in page.data {
                let target_date = match NaiveDate::parse_from_str(&raw.end_date, "%Y-%m-%d") {
                    Ok(d) => d,
                    Err(_) => continue,
                };
                if target_date < from || target_date > to {
                    continue;
                }
                let parsed = match parse_range(&raw.question) {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                markets.push(Market {
                    platform: Platform::Polymarket,
                    market_id: raw.condition_id,
                    city: city.to_string(),
                    target_date,
                    range_name: raw.question,
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
            match page.next_cursor {
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
            method: ResolutionMethod::ClimatologicalReport {
                ready_after_local_hour: 10,
            },
        }
    }
}
