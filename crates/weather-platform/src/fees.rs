use weather_storage::Platform;

/// Per-share fee contribution, charged at entry and again at exit for
/// early closes. Polymarket carries no trading fee for this market
/// class; Kalshi's maker/taker schedule collapses to
/// `0.07 * ask * (1 - ask)` per contract for the weather series.
pub fn entry_fee(platform: Platform, ask: f64) -> f64 {
    match platform {
        Platform::Polymarket => 0.0,
        Platform::Kalshi => 0.07 * ask * (1.0 - ask),
    }
}

/// `ask + entryFee`, the per-share dollar cost used to size a position
/// from a fixed budget.
pub fn effective_cost(platform: Platform, ask: f64) -> f64 {
    ask + entry_fee(platform, ask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polymarket_has_zero_fee() {
        assert_eq!(entry_fee(Platform::Polymarket, 0.35), 0.0);
    }

    #[test]
    fn kalshi_fee_peaks_near_50_cents() {
        let fee_50 = entry_fee(Platform::Kalshi, 0.5);
        let fee_10 = entry_fee(Platform::Kalshi, 0.1);
        let fee_90 = entry_fee(Platform::Kalshi, 0.9);
        assert!(fee_50 > fee_10);
        assert!(fee_50 > fee_90);
        assert!((fee_50 - 0.0175).abs() < 1e-9);
    }

    #[test]
    fn effective_cost_adds_fee_on_top_of_ask() {
        let c = effective_cost(Platform::Kalshi, 0.3);
        assert!((c - (0.3 + entry_fee(Platform::Kalshi, 0.3))).abs() < 1e-12);
    }
}
