use weather_config::CalibrationConfig;
use weather_numerics::range_probability;
use weather_storage::ModelCalibrationBucket;

/// Raw Gaussian probability plus the calibration-corrected value, and the
/// bucket key the correction was (or wasn't) applied from.
pub struct ProbabilityResult {
    pub raw_probability: f64,
    pub corrected_probability: f64,
}

/// Applies the per-(range_type, model_prob_bucket) correction ratio when
/// the bucket has enough samples, capped at `max_correction_ratio` so a
/// sparse or noisy bucket can't swing the corrected probability wildly.
pub fn probability_with_calibration(
    rmin: Option<f64>,
    rmax: Option<f64>,
    mean: f64,
    std_dev: f64,
    bucket: Option<&ModelCalibrationBucket>,
    cfg: &CalibrationConfig,
) -> ProbabilityResult {
    let raw = range_probability(rmin, rmax, mean, std_dev);
    let corrected = match bucket {
        Some(b) if b.n >= cfg.cal_blocks_min_n => {
            let ratio = b.correction_ratio.min(cfg.max_correction_ratio);
            (raw * ratio).clamp(0.0, 1.0)
        }
        _ => raw,
    };
    ProbabilityResult {
        raw_probability: raw,
        corrected_probability: corrected,
    }
}

/// Bucket index for (range_type, probability): coarse deciles, matching
/// the granularity `rebuild_model_calibration` writes at.
pub fn model_prob_bucket(probability: f64) -> i32 {
    ((probability.clamp(0.0, 1.0)) * 10.0).floor().min(9.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_bucket_leaves_probability_uncorrected() {
        let bucket = ModelCalibrationBucket {
            range_type: weather_storage::RangeType::Bounded,
            model_prob_bucket: 5,
            n: 3,
            avg_model_prob: 0.5,
            actual_win_rate: 0.9,
            correction_ratio: 1.8,
        };
        let cfg = CalibrationConfig::default();
        let result = probability_with_calibration(Some(33.5), Some(35.5), 34.5, 2.0, Some(&bucket), &cfg);
        assert_eq!(result.raw_probability, result.corrected_probability);
    }

    #[test]
    fn correction_ratio_is_capped() {
        let bucket = ModelCalibrationBucket {
            range_type: weather_storage::RangeType::Bounded,
            model_prob_bucket: 5,
            n: 100,
            avg_model_prob: 0.2,
            actual_win_rate: 0.9,
            correction_ratio: 4.5,
        };
        let mut cfg = CalibrationConfig::default();
        cfg.max_correction_ratio = 2.0;
        let raw = range_probability(Some(33.5), Some(35.5), 34.5, 2.0);
        let result = probability_with_calibration(Some(33.5), Some(35.5), 34.5, 2.0, Some(&bucket), &cfg);
        assert!((result.corrected_probability - (raw * 2.0).clamp(0.0, 1.0)).abs() < 1e-9);
    }

    #[test]
    fn bucket_index_is_in_range() {
        assert_eq!(model_prob_bucket(0.0), 0);
        assert_eq!(model_prob_bucket(1.0), 9);
        assert_eq!(model_prob_bucket(0.95), 9);
    }
}
