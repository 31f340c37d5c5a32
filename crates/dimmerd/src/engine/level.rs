//! Perceptual brightness correction.
//!
//! Linear PWM duty does not match perceived brightness; the configurable
//! exponent lets an installer compensate for a given LED driver's response
//! curve.

/// Map a linear level fraction in `[0, 1]` to the physical output duty.
///
/// An exponent of exactly 1.0 skips the `powf` call so the identity mapping
/// carries no floating-point drift at the extremes 0.0 and 1.0.
pub fn corrected(fraction: f64, exponent: f64) -> f64 {
    if exponent == 1.0 {
        fraction
    } else {
        fraction.powf(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_one_is_exact_identity() {
        for fraction in [0.0, 0.33, 1.0] {
            assert_eq!(corrected(fraction, 1.0), fraction);
        }
    }

    #[test]
    fn exponent_curves_midrange_down() {
        let out = corrected(0.5, 2.0);
        assert!((out - 0.25).abs() < 1e-12);
        // Endpoints are fixed points of the curve regardless of exponent.
        assert_eq!(corrected(0.0, 2.0), 0.0);
        assert_eq!(corrected(1.0, 2.0), 1.0);
    }
}
