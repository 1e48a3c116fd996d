//! Branch-free logarithm approximations for the meter readout.
//!
//! The meter only needs enough precision to decide whether the level moved by
//! more than the throttle hysteresis, so a second order polynomial on the
//! mantissa is plenty. Hosts that compare meter values bit for bit rely on
//! exactly this approximation.

/// Approximate `log2(value)` for positive finite `value`.
///
/// Splits the float into exponent and mantissa, normalizes the mantissa to
/// `[1, 2)` and fits it with `(-1/3 * m + 2) * m - 2/3`.
#[inline]
pub fn fast_log2(value: f32) -> f32 {
    let bits = value.to_bits();
    let exponent = ((bits >> 23) & 255) as i32 - 128;
    let mantissa = f32::from_bits((bits & !(255 << 23)) + (127 << 23));

    ((-1.0 / 3.0) * mantissa + 2.0) * mantissa - 2.0 / 3.0 + exponent as f32
}

/// Approximate `log10(value)`, scaled from [`fast_log2`].
#[inline]
pub fn fast_log10(value: f32) -> f32 {
    fast_log2(value) / 3.3125
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_at_powers_of_two() {
        for (value, expected) in [(1.0_f32, 0.0_f32), (2.0, 1.0), (0.5, -1.0), (1024.0, 10.0)] {
            assert!((fast_log2(value) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn close_to_std_log2() {
        for &value in &[1e-5_f32, 0.001, 0.3, 0.77, 1.5, 3.0, 42.0, 1000.0] {
            let error = (fast_log2(value) - value.log2()).abs();
            assert!(error < 0.0125, "log2({value}) off by {error}");
        }
    }

    #[test]
    fn db_readout_is_close_enough_for_metering() {
        for &level in &[1e-5_f32, 0.01, 0.25, 0.5, 0.9, 1.0, 2.0] {
            let fast_db = 20.0 * fast_log10(level);
            let exact_db = 20.0 * level.log10();
            // Scaling by 3.3125 instead of log2(10) costs up to ~0.3%
            assert!(
                (fast_db - exact_db).abs() < 0.4,
                "{level}: {fast_db} vs {exact_db}"
            );
        }
    }
}
