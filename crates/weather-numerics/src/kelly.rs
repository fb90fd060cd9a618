//! Kelly criterion sizing for prediction-market contracts.
//!
//! The simplified textbook form `(p*payout - q) / payout` overstates the
//! bet fraction by up to 5x at high ask prices because it ignores that the
//! stake itself is `ask`, not `payout`. The correct per-dollar-at-risk form
//! uses net odds `b = (payout - ask) / ask`.

/// Net odds per dollar at risk for a contract bought at `ask` paying out
/// `payout` (typically 1.0) on a win.
pub fn net_odds(ask: f64, payout: f64) -> f64 {
    (payout - ask) / ask
}

/// Full Kelly fraction for a bet with net odds `b` and true win probability
/// `p`. Returns 0 when the edge is non-positive rather than a negative
/// fraction (no short side in these markets).
pub fn kelly_fraction(b: f64, p: f64) -> f64 {
    if b <= 0.0 {
        return 0.0;
    }
    let q = 1.0 - p;
    ((b * p - q) / b).max(0.0)
}

/// Kelly fraction computed directly from ask/payout/probability, scaled by
/// a fractional multiplier (e.g. 0.5 for half-Kelly).
pub fn kelly_fraction_fractional(ask: f64, payout: f64, p: f64, fraction: f64) -> f64 {
    let b = net_odds(ask, payout);
    kelly_fraction(b, p) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scenario_s2_kelly_correctness() {
        // p=0.80, ask=0.75, payout=1.0 (fee=0), half-Kelly.
        let b = net_odds(0.75, 1.0);
        assert_relative_eq!(b, 0.3333333333, epsilon = 1e-9);

        let full = kelly_fraction(b, 0.80);
        assert_relative_eq!(full, 0.2, epsilon = 1e-6);

        let half = full * 0.5;
        assert_relative_eq!(half, 0.10, epsilon = 1e-6);

        // The naive (p*payout - q) / payout formula overstates this badly.
        let naive = (0.80 * 1.0 - 0.20) / 1.0;
        assert!(naive > half * 5.0, "naive={naive} should overstate half-kelly={half}");
    }

    #[test]
    fn zero_or_negative_edge_yields_zero() {
        let b = net_odds(0.90, 1.0);
        assert_eq!(kelly_fraction(b, 0.50), 0.0);
    }

    #[test]
    fn degenerate_ask_of_payout_has_zero_odds() {
        assert_eq!(net_odds(1.0, 1.0), 0.0);
        assert_eq!(kelly_fraction(0.0, 0.9), 0.0);
    }
}
