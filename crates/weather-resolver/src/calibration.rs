use statrs::statistics::Statistics;
use std::collections::HashMap;
use weather_storage::{
    CityErrorDistribution, MarketCalibrationInput, ModelCalibrationInput, Opportunity, Platform,
    RangeType,
};

fn correction_ratio(actual_win_rate: f64, avg_model_prob: f64, cap: f64) -> f64 {
    if avg_model_prob <= 1e-9 {
        return 1.0;
    }
    (actual_win_rate / avg_model_prob).clamp(1.0 / cap, cap)
}

fn win_rate(rows: &[&Opportunity]) -> f64 {
    rows.iter().map(|o| if o.would_have_won.unwrap_or(false) { 1.0 } else { 0.0 }).collect::<Vec<f64>>().mean()
}

/// Bucketed by (range_type, model_prob_bucket) -- the raw model probability
/// before any market-price information, per spec.md's calibration split.
pub fn build_model_calibration(opportunities: &[Opportunity], correction_ratio_cap: f64) -> Vec<ModelCalibrationInput> {
    let mut groups: HashMap<(RangeType, i32), Vec<&Opportunity>> = HashMap::new();
    for o in opportunities {
        groups.entry((o.range_type, o.model_prob_bucket)).or_default().push(o);
    }
    groups
        .into_iter()
        .map(|((range_type, model_prob_bucket), rows)| {
            let avg_model_prob = rows.iter().map(|o| o.corrected_probability).collect::<Vec<f64>>().mean();
            let actual_win_rate = win_rate(&rows);
            ModelCalibrationInput {
                range_type,
                model_prob_bucket,
                n: rows.len() as i64,
                avg_model_prob,
                actual_win_rate,
                correction_ratio: correction_ratio(actual_win_rate, avg_model_prob, correction_ratio_cap),
            }
        })
        .collect()
}

/// Bucketed by (platform, range_type, lead_time_bucket, price_bucket) --
/// whether the market's own price was a good predictor, independent of the
/// model.
pub fn build_market_calibration(opportunities: &[Opportunity]) -> Vec<MarketCalibrationInput> {
    let mut groups: HashMap<(Platform, RangeType, i32, i32), Vec<&Opportunity>> = HashMap::new();
    for o in opportunities {
        groups
            .entry((o.platform, o.range_type, o.lead_time_bucket, o.price_bucket))
            .or_default()
            .push(o);
    }
    groups
        .into_iter()
        .map(|((platform, range_type, lead_time_bucket, price_bucket), rows)| {
            let empirical_win_rate = win_rate(&rows);
            let market_avg_ask = rows.iter().map(|o| o.ask).collect::<Vec<f64>>().mean();
            MarketCalibrationInput {
                platform,
                range_type,
                lead_time_bucket,
                price_bucket,
                n: rows.len() as i64,
                empirical_win_rate,
                market_avg_ask,
                true_edge: empirical_win_rate - market_avg_ask,
            }
        })
        .collect()
}

/// Per-city percentile distribution of corrected-ensemble signed error,
/// used by the scanner's city_mae gate and the PWS observation path's
/// `city_factor`.
pub fn build_city_error_distribution(errors: &[(String, f64)]) -> Vec<CityErrorDistribution> {
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for (city, err) in errors {
        groups.entry(city.clone()).or_default().push(*err);
    }
    groups
        .into_iter()
        .map(|(city, mut values)| {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mean_error = values.clone().mean();
            let std_dev_error = if values.len() > 1 { values.clone().std_dev() } else { 0.0 };
            CityErrorDistribution {
                city,
                n: values.len() as i64,
                mean_error,
                std_dev_error,
                p5: percentile(&values, 0.05),
                p25: percentile(&values, 0.25),
                p50: percentile(&values, 0.50),
                p75: percentile(&values, 0.75),
                p95: percentile(&values, 0.95),
            }
        })
        .collect()
}

/// Linear-interpolated percentile over an already-sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_ratio_clamps_to_the_cap_on_both_sides() {
        assert_eq!(correction_ratio(0.9, 0.1, 2.0), 2.0);
        assert_eq!(correction_ratio(0.05, 0.9, 2.0), 0.5);
    }

    #[test]
    fn correction_ratio_defaults_to_one_when_model_prob_is_zero() {
        assert_eq!(correction_ratio(0.5, 0.0, 2.0), 1.0);
    }

    #[test]
    fn percentile_of_a_sorted_slice_matches_the_median_at_p50() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&values, 0.5) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn city_error_distribution_groups_by_city_independently() {
        let errors = vec![
            ("nyc".to_string(), 1.0),
            ("nyc".to_string(), -1.0),
            ("chicago".to_string(), 3.0),
        ];
        let dists = build_city_error_distribution(&errors);
        assert_eq!(dists.len(), 2);
        let nyc = dists.iter().find(|d| d.city == "nyc").unwrap();
        assert_eq!(nyc.n, 2);
        assert!((nyc.mean_error - 0.0).abs() < 1e-9);
    }
}
