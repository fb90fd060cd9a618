use crate::error::{PlatformError, PlatformResult};
use crate::types::ParsedRange;
use weather_numerics::apply_continuity_correction;
use weather_storage::RangeType;

/// Extract the first and (optionally) second number in a label, skipping
/// the unit glyphs platforms interleave ("34-35°F", "34° to 35°").
fn extract_numbers(s: &str) -> Vec<f64> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == '.' || (c == '-' && current.is_empty()) {
            current.push(c);
        } else {
            if !current.is_empty() {
                if let Ok(n) = current.parse::<f64>() {
                    out.push(n);
                }
                current.clear();
            }
        }
    }
    if !current.is_empty() {
        if let Ok(n) = current.parse::<f64>() {
            out.push(n);
        }
    }
    out
}

/// Parse a platform's raw range label into `{min, max, type}`, applying
/// continuity correction for whole-integer-resolution boundaries.
/// Handles both bounded forms ("34-35°F", "34° to 35°") and unbounded
/// forms ("above 92°F" / "92°F or above", "10°C or below" / "below 10°C").
pub fn parse_range(raw_label: &str) -> PlatformResult<ParsedRange> {
    let lower = raw_label.to_lowercase();
    let numbers = extract_numbers(&lower);

    if lower.contains("above") || lower.contains("or more") || lower.contains("greater") {
        let n = *numbers
            .first()
            .ok_or_else(|| PlatformError::UnparseableRange(raw_label.to_string()))?;
        let corrected = apply_continuity_correction(Some(n), None);
        return Ok(ParsedRange {
            min: corrected.min,
            max: corrected.max,
            range_type: RangeType::Unbounded,
        });
    }

    if lower.contains("below") || lower.contains("or less") || lower.contains("under") {
        let n = *numbers
            .first()
            .ok_or_else(|| PlatformError::UnparseableRange(raw_label.to_string()))?;
        let corrected = apply_continuity_correction(None, Some(n));
        return Ok(ParsedRange {
            min: corrected.min,
            max: corrected.max,
            range_type: RangeType::Unbounded,
        });
    }

    if numbers.len() >= 2 {
        let (lo, hi) = if numbers[0] <= numbers[1] {
            (numbers[0], numbers[1])
        } else {
            (numbers[1], numbers[0])
        };
        let corrected = apply_continuity_correction(Some(lo), Some(hi));
        return Ok(ParsedRange {
            min: corrected.min,
            max: corrected.max,
            range_type: RangeType::Bounded,
        });
    }

    Err(PlatformError::UnparseableRange(raw_label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_dash_form_applies_continuity_correction() {
        let r = parse_range("34-35°F").unwrap();
        assert_eq!(r.min, Some(33.5));
        assert_eq!(r.max, Some(35.5));
        assert_eq!(r.range_type, RangeType::Bounded);
    }

    #[test]
    fn bounded_to_form_applies_continuity_correction() {
        let r = parse_range("34° to 35°").unwrap();
        assert_eq!(r.min, Some(33.5));
        assert_eq!(r.max, Some(35.5));
    }

    #[test]
    fn unbounded_above_has_no_max() {
        let r = parse_range("above 92°F").unwrap();
        assert_eq!(r.min, Some(91.5));
        assert_eq!(r.max, None);
        assert_eq!(r.range_type, RangeType::Unbounded);
    }

    #[test]
    fn unbounded_below_has_no_min() {
        let r = parse_range("10°C or below").unwrap();
        assert_eq!(r.min, None);
        assert_eq!(r.max, Some(10.5));
    }

    #[test]
    fn garbage_label_is_an_error() {
        assert!(parse_range("no numbers here").is_err());
    }
}
