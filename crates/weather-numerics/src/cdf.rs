//! Standard normal CDF via the Abramowitz & Stegun 7.1.26 rational
//! approximation to `erf`.
//!
//! The naive transcription computes `exp(-x*x/2.0)` directly from the raw
//! argument. That loses precision for `|x|` beyond ~1 and produces roughly a
//! 2.9% error at one standard deviation, which is large enough to silently
//! destroy probability calibration. This implementation instead transforms
//! to `z = |x| / sqrt(2)` and evaluates `exp(-z*z)`, matching the textbook
//! form the approximation was derived for.

const A1: f64 = 0.254_829_592;
const A2: f64 = -0.284_496_736;
const A3: f64 = 1.421_413_741;
const A4: f64 = -1.453_152_027;
const A5: f64 = 1.061_405_429;
const P: f64 = 0.327_591_1;

/// Abramowitz & Stegun 7.1.26 approximation of `erf(z)` for `z >= 0`.
/// Max absolute error ~1.5e-7.
fn erf_nonneg(z: f64) -> f64 {
    let t = 1.0 / (1.0 + P * z);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    1.0 - poly * (-z * z).exp()
}

/// Standard normal cumulative distribution function `Φ(x)`.
pub fn normal_cdf(x: f64) -> f64 {
    let z = x.abs() / std::f64::consts::SQRT_2;
    let erf_z = erf_nonneg(z);
    if x >= 0.0 {
        0.5 * (1.0 + erf_z)
    } else {
        0.5 * (1.0 - erf_z)
    }
}

/// Probability that a normally-distributed value with mean `mu` and stddev
/// `sigma` falls within `[rmin, rmax]`. Either bound may be `None` for an
/// unbounded range; at least one bound must be `Some`.
///
/// - bounded: `Φ((rmax-μ)/σ) - Φ((rmin-μ)/σ)`
/// - unbounded upper (`rmax = None`): `1 - Φ((rmin-μ)/σ)`
/// - unbounded lower (`rmin = None`): `Φ((rmax-μ)/σ)`
pub fn range_probability(rmin: Option<f64>, rmax: Option<f64>, mu: f64, sigma: f64) -> f64 {
    match (rmin, rmax) {
        (Some(lo), Some(hi)) => normal_cdf((hi - mu) / sigma) - normal_cdf((lo - mu) / sigma),
        (Some(lo), None) => 1.0 - normal_cdf((lo - mu) / sigma),
        (None, Some(hi)) => normal_cdf((hi - mu) / sigma),
        (None, None) => 1.0,
    }
    .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Reference values from standard normal tables.
    const TRUTH: [(f64, f64); 7] = [
        (-3.0, 0.001_349_898_031_630_09),
        (-2.0, 0.022_750_131_948_179_2),
        (-1.0, 0.158_655_253_931_457),
        (0.0, 0.5),
        (1.0, 0.841_344_746_068_543),
        (2.0, 0.977_249_868_051_821),
        (3.0, 0.998_650_101_968_37),
    ];

    #[test]
    fn matches_truth_table_within_1e6() {
        for (x, truth) in TRUTH {
            let got = normal_cdf(x);
            assert!(
                (got - truth).abs() < 1e-6,
                "x={x}: got {got}, truth {truth}, diff {}",
                (got - truth).abs()
            );
        }
    }

    #[test]
    fn symmetric_around_zero() {
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(normal_cdf(-1.5) + normal_cdf(1.5), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn scenario_s1_continuity_correction_probability() {
        // Range "34-35F" bounded -> [33.5, 35.5], ensemble mean 34.5, std dev 2.0.
        let p = range_probability(Some(33.5), Some(35.5), 34.5, 2.0);
        assert_relative_eq!(p, 0.3829, epsilon = 2e-4);

        // Without continuity correction the naive [34.0, 35.0] range
        // computes a catastrophically smaller probability.
        let uncorrected = range_probability(Some(34.0), Some(35.0), 34.5, 2.0);
        assert_relative_eq!(uncorrected, 0.1974, epsilon = 2e-4);
    }

    #[test]
    fn unbounded_upper_and_lower_are_complements() {
        let mu = 50.0;
        let sigma = 3.0;
        let threshold = 52.0;
        let upper = range_probability(Some(threshold), None, mu, sigma);
        let lower = range_probability(None, Some(threshold), mu, sigma);
        assert_relative_eq!(upper + lower, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn probabilities_are_bounded() {
        for mu in [-20.0, 0.0, 50.0, 120.0] {
            for sigma in [0.5, 2.0, 10.0] {
                let p = range_probability(Some(mu - 1.0), Some(mu + 1.0), mu, sigma);
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }
}
