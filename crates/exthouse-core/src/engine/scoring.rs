//! Log-normal scoring curve (same shape Lighthouse uses for its metric scores).
//!
//! `score(median) == 0.5`, `score(0) == 1`, values at or below `podr` score
//! above 0.9, and the curve never increases as the value grows.

use crate::config::CurveConstants;

/// Abramowitz & Stegun 7.1.26, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = t * (A1 + t * (A2 + t * (A3 + t * (A4 + t * A5))));
    sign * (1.0 - y * (-x * x).exp())
}

fn clamp_to_two_decimals(v: f64) -> f64 {
    (v.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Score `value` on the curve defined by `(podr, median)`. Result is in [0, 1].
pub fn log_normal_score(value: f64, curve: CurveConstants) -> f64 {
    if value.is_nan() || value <= 0.0 {
        return 1.0;
    }
    let location = curve.median.ln();
    let log_ratio = (curve.podr / curve.median).ln();
    let shape = (1.0 - 3.0 * log_ratio - ((log_ratio - 3.0).powi(2) - 8.0).sqrt()).sqrt() / 2.0;
    let standardized = (value.ln() - location) / (std::f64::consts::SQRT_2 * shape);
    let complementary_percentile = (1.0 - erf(standardized)) / 2.0;
    clamp_to_two_decimals(complementary_percentile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIME: CurveConstants = CurveConstants::new(50.0, 250.0);
    const FILES: CurveConstants = CurveConstants::new(1.0, 2.0);

    #[test]
    fn zero_scores_one() {
        assert_eq!(log_normal_score(0.0, TIME), 1.0);
        assert_eq!(log_normal_score(0.0, FILES), 1.0);
    }

    #[test]
    fn median_scores_half() {
        assert_eq!(log_normal_score(250.0, TIME), 0.5);
        assert_eq!(log_normal_score(2.0, FILES), 0.5);
    }

    #[test]
    fn podr_scores_high() {
        let s = log_normal_score(50.0, TIME);
        assert!(s > 0.9 && s < 1.0, "podr score was {}", s);
    }

    #[test]
    fn bounded_and_non_increasing() {
        for curve in [TIME, FILES] {
            let mut prev = 1.0;
            for i in 0..2_000 {
                let v = i as f64 * 2.5;
                let s = log_normal_score(v, curve);
                assert!((0.0..=1.0).contains(&s), "score {} out of range at {}", s, v);
                assert!(s <= prev, "score rose from {} to {} at {}", prev, s, v);
                prev = s;
            }
        }
    }

    #[test]
    fn huge_values_floor_at_zero() {
        assert_eq!(log_normal_score(1e9, TIME), 0.0);
        assert_eq!(log_normal_score(f64::INFINITY, TIME), 0.0);
    }

    #[test]
    fn erf_is_odd() {
        for x in [0.1, 0.5, 1.0, 2.5] {
            assert!((erf(x) + erf(-x)).abs() < 1e-12);
        }
        assert!(erf(0.0).abs() < 1e-8);
    }
}
