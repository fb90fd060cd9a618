//! Small, well-tested numerics shared by the forecast, scanner, and
//! executor crates: the normal CDF, continuity correction, and the Kelly
//! criterion. Kept isolated and reference-tied because these three formulas
//! have historically been the source of calibration-destroying bugs.

mod calibration;
mod cdf;
mod continuity;
mod kelly;

pub use calibration::edge_bypass;
pub use cdf::{normal_cdf, range_probability};
pub use continuity::{apply_continuity_correction, CorrectedRange};
pub use kelly::{kelly_fraction, kelly_fraction_fractional, net_odds};
