use chrono::NaiveDate;
use dashmap::DashSet;
use weather_storage::{Platform, Side};

/// In-memory fast-path dedup set for the observation (guaranteed-win)
/// path, closing the race window between two concurrent detection passes
/// that both see the database before either has committed a trade.
pub struct FastPathDedup {
    seen: DashSet<String>,
}

impl FastPathDedup {
    pub fn new() -> Self {
        Self { seen: DashSet::new() }
    }

    fn key(city: &str, target_date: NaiveDate, platform: Platform, range_name: &str, side: Side) -> String {
        format!("{city}|{target_date}|{}|{range_name}|{:?}", platform.as_str(), side)
    }

    /// Returns true if this key was not already claimed, and claims it.
    pub fn try_claim(
        &self,
        city: &str,
        target_date: NaiveDate,
        platform: Platform,
        range_name: &str,
        side: Side,
    ) -> bool {
        self.seen.insert(Self::key(city, target_date, platform, range_name, side))
    }

    pub fn release(
        &self,
        city: &str,
        target_date: NaiveDate,
        platform: Platform,
        range_name: &str,
        side: Side,
    ) {
        self.seen.remove(&Self::key(city, target_date, platform, range_name, side));
    }
}

impl Default for FastPathDedup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn second_claim_of_the_same_key_fails() {
        let dedup = FastPathDedup::new();
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert!(dedup.try_claim("nyc", date, Platform::Polymarket, "34-35", Side::Yes));
        assert!(!dedup.try_claim("nyc", date, Platform::Polymarket, "34-35", Side::Yes));
    }

    #[test]
    fn release_allows_reclaiming() {
        let dedup = FastPathDedup::new();
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        dedup.try_claim("nyc", date, Platform::Polymarket, "34-35", Side::Yes);
        dedup.release("nyc", date, Platform::Polymarket, "34-35", Side::Yes);
        assert!(dedup.try_claim("nyc", date, Platform::Polymarket, "34-35", Side::Yes));
    }
}
