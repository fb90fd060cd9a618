use weather_config::ForecastSourceConfig;

/// One source's rolling accuracy record going into the weighting pass.
#[derive(Debug, Clone)]
pub struct SourceMae {
    pub name: &'static str,
    pub mae: f64,
    pub is_resolution_source: bool,
}

#[derive(Debug, Clone)]
pub struct WeightedSource {
    pub name: &'static str,
    pub weight: f64,
    pub demoted: bool,
}

/// Build ensemble weights `∝ 1/MAE`, applying hard/relative/soft demotion
/// in that order, then the resolution-source boost. Soft demotion only
/// engages when full (zero-weight) demotion would drop the active-source
/// count below `min_active_sources` -- it trades calibration purity for
/// coverage rather than going dark on a city.
pub fn build_weights(sources: &[SourceMae], cfg: &ForecastSourceConfig, unit_is_celsius: bool) -> Vec<WeightedSource> {
    if sources.is_empty() {
        return Vec::new();
    }

    let ceiling = if unit_is_celsius {
        cfg.demotion_mae_ceiling_c
    } else {
        cfg.demotion_mae_ceiling_f
    };
    let best_mae = sources
        .iter()
        .map(|s| s.mae)
        .fold(f64::INFINITY, f64::min);

    let mut raw: Vec<(SourceMae, f64, bool)> = sources
        .iter()
        .map(|s| {
            let hard_demoted = s.mae > ceiling;
            let relative_demoted = best_mae.is_finite() && s.mae > cfg.relative_demotion_factor * best_mae;
            let demoted = hard_demoted || relative_demoted;
            let weight = if s.mae <= 0.0 { 1.0 } else { 1.0 / s.mae };
            (s.clone(), weight, demoted)
        })
        .collect();

    let surviving_if_demoted = raw.iter().filter(|(_, _, demoted)| !demoted).count();

    let mut out = Vec::with_capacity(raw.len());
    for (s, mut weight, demoted) in raw.drain(..) {
        let final_weight = if demoted {
            if surviving_if_demoted < cfg.min_active_sources {
                weight * cfg.soft_demotion_weight_cap.min(1.0)
            } else {
                0.0
            }
        } else {
            if s.is_resolution_source {
                weight *= cfg.resolution_source_boost_factor;
            }
            weight
        };
        out.push(WeightedSource {
            name: s.name,
            weight: final_weight,
            demoted,
        });
    }

    let total: f64 = out.iter().map(|w| w.weight).sum();
    if total > 0.0 {
        for w in out.iter_mut() {
            w.weight /= total;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ForecastSourceConfig {
        ForecastSourceConfig::default()
    }

    #[test]
    fn hard_demotion_zeroes_weight_when_enough_sources_remain() {
        let sources = vec![
            SourceMae { name: "a", mae: 1.0, is_resolution_source: false },
            SourceMae { name: "b", mae: 1.2, is_resolution_source: false },
            SourceMae { name: "c", mae: 20.0, is_resolution_source: false },
        ];
        let weighted = build_weights(&sources, &cfg(), false);
        let demoted_one = weighted.iter().find(|w| w.name == "c").unwrap();
        assert_eq!(demoted_one.weight, 0.0);
    }

    #[test]
    fn soft_demotion_keeps_nonzero_weight_below_floor() {
        let mut c = cfg();
        c.min_active_sources = 5;
        let sources = vec![
            SourceMae { name: "a", mae: 1.0, is_resolution_source: false },
            SourceMae { name: "b", mae: 20.0, is_resolution_source: false },
        ];
        let weighted = build_weights(&sources, &c, false);
        let demoted_one = weighted.iter().find(|w| w.name == "b").unwrap();
        assert!(demoted_one.weight > 0.0);
    }

    #[test]
    fn resolution_source_gets_boosted_relative_to_equal_mae_peer() {
        let sources = vec![
            SourceMae { name: "a", mae: 2.0, is_resolution_source: false },
            SourceMae { name: "b", mae: 2.0, is_resolution_source: true },
        ];
        let weighted = build_weights(&sources, &cfg(), false);
        let a = weighted.iter().find(|w| w.name == "a").unwrap();
        let b = weighted.iter().find(|w| w.name == "b").unwrap();
        assert!(b.weight > a.weight);
    }

    #[test]
    fn weights_sum_to_one_when_any_survive() {
        let sources = vec![
            SourceMae { name: "a", mae: 1.0, is_resolution_source: false },
            SourceMae { name: "b", mae: 1.5, is_resolution_source: false },
        ];
        let weighted = build_weights(&sources, &cfg(), false);
        let total: f64 = weighted.iter().map(|w| w.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
