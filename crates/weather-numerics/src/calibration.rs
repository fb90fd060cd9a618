//! Shared calibration-bypass predicate consumed by both the scanner's
//! `max_model_market_ratio` skip and the monitor's `edge_gone`
//! suppression. Keeping this as one pure function rather than two
//! hand-copied conditions is what past duplication bugs cost weeks to
//! track down: the two sites drifted out of sync and the monitor started
//! killing trades the scanner had just entered on calibration's say-so.

/// True when a market-calibration bucket has enough history to trust and
/// shows a positive true edge -- the bucket's own verdict overrides the
/// model-vs-market divergence check that would otherwise fire.
pub fn edge_bypass(bucket_n: i64, bucket_true_edge: f64, min_n: i64) -> bool {
    bucket_n >= min_n && bucket_true_edge > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_bucket_never_bypasses() {
        assert!(!edge_bypass(5, 0.5, 50));
    }

    #[test]
    fn negative_edge_never_bypasses_even_with_enough_samples() {
        assert!(!edge_bypass(100, -0.1, 50));
    }

    #[test]
    fn sufficient_samples_and_positive_edge_bypasses() {
        assert!(edge_bypass(100, 0.2, 50));
    }
}
