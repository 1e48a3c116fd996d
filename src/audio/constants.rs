/// Gain stage and meter constants
/// These are domain-tuned defaults, keep the literal values unless the product changes them

/// Gain request range
pub const GAIN_MIN_DB: f32 = -20.0;
pub const GAIN_MAX_DB: f32 = 20.0;

/// Corner frequency of the one-pole gain smoother
pub const SMOOTHING_CORNER_HZ: f32 = 20.0;

/// Nominal smoothing numerator used before the first block arrives (omega = 9.72 / rate)
pub const NOMINAL_SMOOTHING: f32 = 9.72;

/// Peak meter fall rate
pub const METER_FALLOFF_DB_PER_SEC: f32 = 15.0;

/// Meter floor: linear levels at or below this read as the dB floor
pub const METER_FLOOR_LINEAR: f32 = 1e-6;
pub const METER_FLOOR_DB: f32 = -120.0;

/// Minimum dB change before the meter port is written again
pub const METER_THROTTLE_DB: f32 = 0.2;

/// Offsets added to the working level and gain at block start so neither stalls in denormals
pub const LEVEL_EPSILON: f32 = 1e-20;
pub const GAIN_EPSILON: f32 = 1e-10;

/// Meter display zones (dB thresholds)
pub const ZONE_WARM_DB: f32 = -3.0;
pub const ZONE_HOT_DB: f32 = -1.0;
pub const ZONE_CLIP_DB: f32 = 0.0;

// === HELPER FUNCTIONS ===

/// Clamp a gain request into the supported range
pub fn clamp_gain_db(gain_db: f32) -> f32 {
    gain_db.clamp(GAIN_MIN_DB, GAIN_MAX_DB)
}

/// Convert decibels to linear amplitude
pub fn db_to_linear(db: f32) -> f32 {
    libm::powf(10.0, 0.05 * db)
}

/// Per-sample smoothing coefficient for the gain smoother
pub fn smoothing_coefficient(rate_hz: f32) -> f32 {
    1.0 - libm::expf(-2.0 * std::f32::consts::PI * SMOOTHING_CORNER_HZ / rate_hz)
}

/// Per-block multiplicative meter decay for a block of `block_size` samples
pub fn meter_falloff(rate_hz: f32, block_size: u32) -> f32 {
    let block_seconds = block_size as f32 / rate_hz;
    libm::powf(10.0, -0.05 * METER_FALLOFF_DB_PER_SEC * block_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_requests() {
        assert_eq!(clamp_gain_db(100.0), GAIN_MAX_DB);
        assert_eq!(clamp_gain_db(-100.0), GAIN_MIN_DB);
        assert_eq!(clamp_gain_db(f32::INFINITY), GAIN_MAX_DB);
        assert_eq!(clamp_gain_db(3.5), 3.5);
    }

    #[test]
    fn smoothing_coefficient_at_48k() {
        let omega = smoothing_coefficient(48_000.0);
        let expected = 1.0 - (-2.0 * std::f64::consts::PI * 20.0 / 48_000.0_f64).exp();
        assert!((omega as f64 - expected).abs() < 1e-6);
    }

    #[test]
    fn falloff_is_fifteen_db_per_second() {
        // One second split into 100 blocks falls by 15 dB in total
        let falloff = meter_falloff(48_000.0, 480);
        let per_second = falloff.powi(100);
        assert!((per_second - db_to_linear(-15.0)).abs() < 1e-4);
    }

    #[test]
    fn empty_block_does_not_decay() {
        assert_eq!(meter_falloff(44_100.0, 0), 1.0);
    }

    #[test]
    fn db_conversion() {
        assert!((db_to_linear(20.0) - 10.0).abs() < 1e-5);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-7);
        assert_eq!(db_to_linear(0.0), 1.0);
    }
}
