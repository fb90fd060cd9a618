use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    F,
    C,
}

/// Static, effectively-immutable-per-run configuration for one city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityConfig {
    pub name: String,
    /// IANA timezone name, e.g. "America/New_York".
    pub timezone: String,
    pub lat: f64,
    pub lon: f64,
    pub unit: Unit,
    /// Polymarket's resolution station identifier for this city.
    pub polymarket_station: String,
    /// Kalshi's resolution station identifier for this city (may differ
    /// from `polymarket_station`, making this a dual-station city).
    pub kalshi_station: String,
    /// Nearby personal weather station identifiers used by the PWS fast
    /// path (three-station corrected-median).
    pub pws_station_ids: Vec<String>,
    /// Mute Kalshi entries for this city (resolution source has unresolved
    /// bias). Scanning for calibration purposes continues.
    #[serde(default)]
    pub kalshi_blocked: bool,
    /// When true, the forecast engine's resolution-source weight boost
    /// applies to this city's NWS-sourced temperature.
    #[serde(default)]
    pub kalshi_nws_priority: bool,
}

impl CityConfig {
    /// True when the two platforms resolve against different stations,
    /// which demotes the confidence tier by one level (§4.3).
    pub fn is_dual_station(&self) -> bool {
        self.polymarket_station != self.kalshi_station
    }
}

pub fn default_cities() -> Vec<CityConfig> {
    vec![
        CityConfig {
            name: "New York City".into(),
            timezone: "America/New_York".into(),
            lat: 40.7128,
            lon: -74.0060,
            unit: Unit::F,
            polymarket_station: "KNYC".into(),
            kalshi_station: "KNYC".into(),
            pws_station_ids: vec!["KNYCENTR14".into(), "KNYBROOK58".into(), "KNYQUEEN23".into()],
            kalshi_blocked: false,
            kalshi_nws_priority: true,
        },
        CityConfig {
            name: "Chicago".into(),
            timezone: "America/Chicago".into(),
            lat: 41.8781,
            lon: -87.6298,
            unit: Unit::F,
            polymarket_station: "KMDW".into(),
            kalshi_station: "KORD".into(),
            pws_station_ids: vec!["KILCHICA87".into(), "KILCHICA112".into()],
            kalshi_blocked: false,
            kalshi_nws_priority: false,
        },
        CityConfig {
            name: "Seattle".into(),
            timezone: "America/Los_Angeles".into(),
            lat: 47.6062,
            lon: -122.3321,
            unit: Unit::F,
            polymarket_station: "KSEA".into(),
            kalshi_station: "KSEA".into(),
            pws_station_ids: vec!["KWASEATT123".into()],
            kalshi_blocked: false,
            kalshi_nws_priority: false,
        },
        CityConfig {
            name: "Atlanta".into(),
            timezone: "America/New_York".into(),
            lat: 33.7490,
            lon: -84.3880,
            unit: Unit::F,
            polymarket_station: "KATL".into(),
            kalshi_station: "KATL".into(),
            pws_station_ids: vec!["KGAATLAN89".into()],
            kalshi_blocked: false,
            kalshi_nws_priority: false,
        },
        CityConfig {
            name: "Dallas".into(),
            timezone: "America/Chicago".into(),
            lat: 32.7767,
            lon: -96.7970,
            unit: Unit::F,
            polymarket_station: "KDFW".into(),
            kalshi_station: "KDAL".into(),
            pws_station_ids: vec!["KTXDALLA210".into()],
            kalshi_blocked: false,
            kalshi_nws_priority: false,
        },
    ]
}

/// Toronto is used by scenario S4 (city-local midnight across a timezone
/// with no DST overlap quirks relative to US Eastern).
pub fn toronto() -> CityConfig {
    CityConfig {
        name: "Toronto".into(),
        timezone: "America/Toronto".into(),
        lat: 43.6532,
        lon: -79.3832,
        unit: Unit::C,
        polymarket_station: "CYYZ".into(),
        kalshi_station: "CYYZ".into(),
        pws_station_ids: vec![],
        kalshi_blocked: false,
        kalshi_nws_priority: false,
    }
}
