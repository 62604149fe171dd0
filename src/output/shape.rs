//! Float shaping at the output boundary
//!
//! Every float leaving the crate passes through one of these helpers:
//! non-finite values become `None` (serialized as `null`) and finite values
//! are rounded to a fixed number of decimals.

/// Prices, ratios, z-scores, percentages
pub const DEFAULT_DP: i32 = 2;

pub const CORRELATION_DP: i32 = 3;

/// Round to `dp` decimals; None for NaN and infinities
pub fn finite(value: f64, dp: i32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let factor = 10f64.powi(dp);
    let rounded = (value * factor).round() / factor;
    if !rounded.is_finite() {
        return Some(value);
    }
    // no "-0.0" in the output
    Some(if rounded == 0.0 { 0.0 } else { rounded })
}

pub fn finite_opt(value: Option<f64>, dp: i32) -> Option<f64> {
    value.and_then(|v| finite(v, dp))
}

pub fn num(value: f64) -> Option<f64> {
    finite(value, DEFAULT_DP)
}

pub fn num_opt(value: Option<f64>) -> Option<f64> {
    finite_opt(value, DEFAULT_DP)
}

pub fn correlation(value: Option<f64>) -> Option<f64> {
    finite_opt(value, CORRELATION_DP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_is_none() {
        assert_eq!(num(f64::NAN), None);
        assert_eq!(num(f64::INFINITY), None);
        assert_eq!(num(f64::NEG_INFINITY), None);
        assert_eq!(num_opt(None), None);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(num(4.166_666), Some(4.17));
        assert_eq!(num(-1.234_9), Some(-1.23));
        assert_eq!(correlation(Some(0.123_56)), Some(0.124));
        assert_eq!(num(-0.001), Some(0.0));
        assert!(num(-0.001).unwrap().is_sign_positive());
    }

    #[test]
    fn test_huge_values_survive() {
        assert_eq!(num(1e308), Some(1e308));
    }
}
