//! Continuity correction for whole-integer-resolution temperature ranges.
//!
//! Both platforms resolve markets against whole-integer temperatures, so a
//! label like "34-35F" actually covers the continuous interval [33.5, 35.5).
//! Any parsed boundary must be expanded by half a degree in the direction
//! that widens the range.

/// A parsed, continuity-corrected temperature range. `None` on either side
/// means unbounded in that direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Apply the ±0.5 continuity correction to raw integer (or half-integer)
/// boundaries parsed from a market label.
pub fn apply_continuity_correction(raw_min: Option<f64>, raw_max: Option<f64>) -> CorrectedRange {
    CorrectedRange {
        min: raw_min.map(|v| v - 0.5),
        max: raw_max.map(|v| v + 0.5),
    }
}

impl CorrectedRange {
    /// Width of the range in degrees, or `None` if unbounded on either side.
    pub fn width(&self) -> Option<f64> {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => Some(hi - lo),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounded_range_widens_by_one_degree() {
        let r = apply_continuity_correction(Some(34.0), Some(35.0));
        assert_relative_eq!(r.min.unwrap(), 33.5);
        assert_relative_eq!(r.max.unwrap(), 35.5);
        assert_relative_eq!(r.width().unwrap(), 1.0);
    }

    #[test]
    fn invariant_5_width_at_least_one_degree() {
        for (lo, hi) in [(0.0, 1.0), (34.0, 35.0), (-10.0, -9.0), (99.0, 100.0)] {
            let r = apply_continuity_correction(Some(lo), Some(hi));
            assert!(r.width().unwrap() >= 1.0);
        }
    }

    #[test]
    fn unbounded_upper_has_no_max() {
        let r = apply_continuity_correction(Some(90.0), None);
        assert_relative_eq!(r.min.unwrap(), 89.5);
        assert!(r.max.is_none());
        assert!(r.width().is_none());
    }

    #[test]
    fn unbounded_lower_has_no_min() {
        let r = apply_continuity_correction(None, Some(20.0));
        assert!(r.min.is_none());
        assert_relative_eq!(r.max.unwrap(), 20.5);
    }
}
