use crate::weighting::WeightedSource;
use statrs::statistics::Statistics;

/// Confidence tier, coarse buckets indexed by raw ensemble spread when no
/// empirical std dev is available yet for a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Pooled fallback std dev (degrees F, day-1) for this tier.
    fn pooled_std_dev(self) -> f64 {
        match self {
            ConfidenceTier::High => 1.5,
            ConfidenceTier::Medium => 2.5,
            ConfidenceTier::Low => 4.0,
        }
    }

    fn demote(self) -> ConfidenceTier {
        match self {
            ConfidenceTier::High => ConfidenceTier::Medium,
            ConfidenceTier::Medium => ConfidenceTier::Low,
            ConfidenceTier::Low => ConfidenceTier::Low,
        }
    }

    pub fn from_raw_spread(spread: f64) -> Self {
        if spread < 1.5 {
            ConfidenceTier::High
        } else if spread < 3.0 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

pub struct EnsembleResult {
    pub mean: f64,
    pub std_dev: f64,
    pub source_disagreement: f64,
    pub kalshi_temp: Option<f64>,
}

/// Weighted mean/std dev of source readings, then std-dev resolution
/// following the fallback chain: empirical per-city -> pooled ->
/// confidence-tiered table, each time-scaled by `sqrt(days_out)` since the
/// tier tables are day-1 accuracy. Dual-station cities demote the tier by
/// one level, widening the distribution to reflect the unmodeled
/// microclimate gap.
pub fn compute_ensemble(
    readings: &[(f64, f64)], // (temp, weight)
    kalshi_temp: Option<f64>,
    empirical_std_dev: Option<f64>,
    days_out: f64,
    is_dual_station: bool,
) -> EnsembleResult {
    let mean = readings.iter().map(|(t, w)| t * w).sum::<f64>();
    let temps: Vec<f64> = readings.iter().map(|(t, _)| *t).collect();
    let source_disagreement = if temps.len() > 1 { temps.std_dev() } else { 0.0 };

    let time_scale = days_out.max(0.0).sqrt().max(1.0);

    let base_std_dev = match empirical_std_dev {
        Some(sd) if sd > 0.0 => sd,
        _ => {
            let mut tier = ConfidenceTier::from_raw_spread(source_disagreement);
            if is_dual_station {
                tier = tier.demote();
            }
            tier.pooled_std_dev()
        }
    };

    EnsembleResult {
        mean,
        std_dev: base_std_dev * time_scale,
        source_disagreement,
        kalshi_temp,
    }
}

pub fn weighted_breakdown(readings: &[(&'static str, f64)], weights: &[WeightedSource]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, temp) in readings {
        let weight = weights.iter().find(|w| w.name == *name).map(|w| w.weight).unwrap_or(0.0);
        map.insert(
            name.to_string(),
            serde_json::json!({"temp": temp, "weight": weight}),
        );
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weighted_mean_matches_manual_calculation() {
        let readings = vec![(80.0, 0.5), (82.0, 0.5)];
        let result = compute_ensemble(&readings, None, None, 1.0, false);
        assert_relative_eq!(result.mean, 81.0, epsilon = 1e-9);
    }

    #[test]
    fn time_scaling_grows_with_days_out() {
        let readings = vec![(80.0, 1.0)];
        let day1 = compute_ensemble(&readings, None, Some(2.0), 1.0, false);
        let day4 = compute_ensemble(&readings, None, Some(2.0), 4.0, false);
        assert_relative_eq!(day4.std_dev, day1.std_dev * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn dual_station_widens_distribution_via_tier_demotion() {
        let readings = vec![(80.0, 0.5), (80.5, 0.5)];
        let single = compute_ensemble(&readings, None, None, 1.0, false);
        let dual = compute_ensemble(&readings, None, None, 1.0, true);
        assert!(dual.std_dev > single.std_dev);
    }
}
