//! Builds the trait-object fleets the rest of the agent is generic over:
//! one `PlatformClient` per market platform, one `ForecastSource` per
//! ensemble input. Construction is the only place that knows which
//! concrete types exist -- everything downstream takes `&dyn`.

use weather_config::EngineConfig;
use weather_forecast::{CommercialSource, ForecastSource, NwsSource, OpenMeteoSource};
use weather_platform::{KalshiClient, PlatformClient, PolymarketClient};
use weather_storage::Platform;

pub fn build_platform_clients(cfg: &EngineConfig) -> Vec<Box<dyn PlatformClient>> {
    vec![
        Box::new(PolymarketClient::new(cfg.polymarket_api_key.clone())),
        Box::new(KalshiClient::new(cfg.kalshi_api_key.clone(), cfg.kalshi_private_key_pem.clone())),
    ]
}

pub fn platform_client_for<'a>(
    clients: &'a [Box<dyn PlatformClient>],
    platform: Platform,
) -> Option<&'a dyn PlatformClient> {
    clients.iter().find(|c| c.platform() == platform).map(|c| c.as_ref())
}

/// NWS is marked as the resolution source only for cities where Kalshi's
/// settlement station trusts NWS over the platform's own climatological
/// report (`kalshi_nws_priority`). The commercial source is dropped
/// entirely, not merely demoted, when no API key is configured.
pub fn build_forecast_sources(cfg: &EngineConfig, kalshi_nws_priority: bool) -> Vec<Box<dyn ForecastSource>> {
    let mut sources: Vec<Box<dyn ForecastSource>> = vec![
        Box::new(OpenMeteoSource),
        Box::new(NwsSource { is_resolution_source: kalshi_nws_priority }),
    ];
    if let Some(api_key) = cfg.forecast_commercial_api_key.clone() {
        sources.push(Box::new(CommercialSource { api_key }));
    }
    sources
}
