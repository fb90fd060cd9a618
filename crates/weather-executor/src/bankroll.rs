use crate::error::ExecutorResult;
use chrono::NaiveDate;
use weather_config::SizingConfig;
use weather_storage::{Side, StorageGateway};

/// Bankroll state reconstructed from the database at the start of every
/// cycle rather than carried as process-wide mutable state, so a restart
/// can never double-spend or lose track of exposure (spec.md §9).
pub struct Bankroll {
    yes_used: f64,
    no_used: f64,
    yes_limit: f64,
    no_limit: f64,
}

impl Bankroll {
    pub async fn refresh(storage: &StorageGateway, cfg: &SizingConfig) -> ExecutorResult<Self> {
        let yes_used = storage.sum_open_cost_by_side(Side::Yes).await?;
        let no_used = storage.sum_open_cost_by_side(Side::No).await?;
        Ok(Self {
            yes_used,
            no_used,
            yes_limit: cfg.yes_bankroll,
            no_limit: cfg.no_bankroll,
        })
    }

    pub fn available(&self, side: Side) -> f64 {
        match side {
            Side::Yes => (self.yes_limit - self.yes_used).max(0.0),
            Side::No => (self.no_limit - self.no_used).max(0.0),
        }
    }

    /// Booked after a trade is sized so the next candidate in the same
    /// cycle sees updated exposure without a round-trip to storage.
    pub fn book(&mut self, side: Side, cost: f64) {
        match side {
            Side::Yes => self.yes_used += cost,
            Side::No => self.no_used += cost,
        }
    }
}

/// Per-date NO exposure cap, tracked separately from the side-wide NO
/// bankroll because a single bad resolution day can concentrate losses
/// across every NO position opened against it.
pub struct NoDateCap {
    used: f64,
    limit: f64,
}

impl NoDateCap {
    pub async fn refresh(
        storage: &StorageGateway,
        cfg: &SizingConfig,
        target_date: NaiveDate,
    ) -> ExecutorResult<Self> {
        let used = storage.sum_open_no_cost_by_date(target_date).await?;
        Ok(Self { used, limit: cfg.no_max_per_date })
    }

    pub fn available(&self) -> f64 {
        (self.limit - self.used).max(0.0)
    }

    pub fn book(&mut self, cost: f64) {
        self.used += cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_reduces_available_bankroll() {
        let mut b = Bankroll { yes_used: 0.0, no_used: 0.0, yes_limit: 100.0, no_limit: 50.0 };
        assert_eq!(b.available(Side::Yes), 100.0);
        b.book(Side::Yes, 40.0);
        assert_eq!(b.available(Side::Yes), 60.0);
        assert_eq!(b.available(Side::No), 50.0);
    }

    #[test]
    fn exhausted_bankroll_floors_at_zero() {
        let mut b = Bankroll { yes_used: 0.0, no_used: 0.0, yes_limit: 10.0, no_limit: 10.0 };
        b.book(Side::Yes, 25.0);
        assert_eq!(b.available(Side::Yes), 0.0);
    }
}
