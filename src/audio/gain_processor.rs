use crate::audio::constants::{
    self, GAIN_EPSILON, LEVEL_EPSILON, METER_FLOOR_DB, METER_FLOOR_LINEAR, METER_THROTTLE_DB,
    NOMINAL_SMOOTHING,
};
use crate::audio::fast_math::fast_log10;
use nih_plug::{nih_debug_assert, nih_debug_assert_eq};

/// Scalar control ports read once per block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInputs {
    /// Requested gain in dB, any value (clamped internally)
    pub gain_db: f32,
    /// Enable flag, anything above zero means enabled
    pub enable: f32,
}

impl ControlInputs {
    pub fn new(gain_db: f32, enabled: bool) -> Self {
        Self {
            gain_db,
            enable: if enabled { 1.0 } else { 0.0 },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enable > 0.0
    }
}

impl Default for ControlInputs {
    fn default() -> Self {
        Self::new(0.0, true)
    }
}

/// Smoothed gain stage with a shared peak meter
///
/// Owns all per-instance state. Every processing call runs to completion on the
/// audio thread without allocating, locking or failing.
#[derive(Debug, Clone)]
pub struct GainProcessor {
    rate_hz: f32,

    // Derived from the rate and the last seen block size
    omega: f32,
    falloff: f32,
    block_size: u32,

    gain: f32,
    target_gain: f32,
    target_gain_db: f32,

    meter_level: f32,
    /// Throttle baseline: the dB value of the last meter port write
    reported_db: f32,
}

/// Working copy of the state for one block
struct BlockState {
    level: f32,
    gain: f32,
    target: f32,
    omega: f32,
}

impl BlockState {
    #[inline]
    fn step(&mut self) -> f32 {
        self.gain += self.omega * (self.target - self.gain);
        self.gain
    }

    /// Peak-hold over the samples just written
    #[inline]
    fn hold_peak(&mut self, samples: &[f32]) {
        for sample in samples {
            let magnitude = sample.abs();
            if magnitude > self.level {
                self.level = magnitude;
            }
        }
    }
}

impl GainProcessor {
    /// Fresh state for one plugin instance
    pub fn new(rate_hz: f32) -> Self {
        nih_debug_assert!(rate_hz > 0.0, "sample rate must be positive");

        Self {
            rate_hz,
            omega: NOMINAL_SMOOTHING / rate_hz,
            falloff: 0.0,
            block_size: 0,
            gain: 0.0,
            target_gain: 1.0,
            target_gain_db: 0.0,
            meter_level: 0.0,
            reported_db: 0.0,
        }
    }

    pub fn rate_hz(&self) -> f32 {
        self.rate_hz
    }

    pub fn smoothing_coeff(&self) -> f32 {
        self.omega
    }

    pub fn meter_falloff(&self) -> f32 {
        self.falloff
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// The smoothed gain applied to the last sample
    pub fn current_gain(&self) -> f32 {
        self.gain
    }

    pub fn target_gain(&self) -> f32 {
        self.target_gain
    }

    /// Linear peak level as of the end of the last block
    pub fn meter_level(&self) -> f32 {
        self.meter_level
    }

    /// Pick up a new gain request and block size
    ///
    /// Coefficients are recomputed only when the block size changes, the target
    /// only when the request changes.
    pub fn refresh_parameters(&mut self, requested_gain_db: f32, block_size: u32) {
        if self.block_size != block_size {
            self.falloff = constants::meter_falloff(self.rate_hz, block_size);
            self.omega = constants::smoothing_coefficient(self.rate_hz);
            self.block_size = block_size;
        }

        // NaN requests keep the previous target
        if self.target_gain_db != requested_gain_db && !requested_gain_db.is_nan() {
            self.target_gain_db = requested_gain_db;
            self.target_gain = constants::db_to_linear(constants::clamp_gain_db(requested_gain_db));
        }
    }

    /// Process one mono block, returns the value to write to the meter port if any
    pub fn process_mono(
        &mut self,
        controls: ControlInputs,
        input: &[f32],
        output: &mut [f32],
    ) -> Option<f32> {
        nih_debug_assert_eq!(input.len(), output.len());
        let n = input.len().min(output.len());
        let (input, output) = (&input[..n], &mut output[..n]);

        let mut block = self.begin_block(controls, n);

        for (out, sample) in output.iter_mut().zip(input) {
            *out = sample * block.step();
        }
        block.hold_peak(output);

        self.finish_block(block)
    }

    /// Mono processing for hosts that pass a single buffer for input and output
    pub fn process_mono_in_place(
        &mut self,
        controls: ControlInputs,
        buffer: &mut [f32],
    ) -> Option<f32> {
        let mut block = self.begin_block(controls, buffer.len());

        for sample in buffer.iter_mut() {
            *sample *= block.step();
        }
        block.hold_peak(buffer);

        self.finish_block(block)
    }

    /// Process one stereo block. Both channels share the smoother and the meter
    pub fn process_stereo(
        &mut self,
        controls: ControlInputs,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) -> Option<f32> {
        nih_debug_assert!(
            in_left.len() == in_right.len()
                && in_left.len() == out_left.len()
                && in_left.len() == out_right.len(),
            "stereo buffers must have the same length"
        );
        let n = in_left
            .len()
            .min(in_right.len())
            .min(out_left.len())
            .min(out_right.len());
        let (in_left, in_right) = (&in_left[..n], &in_right[..n]);
        let (out_left, out_right) = (&mut out_left[..n], &mut out_right[..n]);

        let mut block = self.begin_block(controls, n);

        for i in 0..n {
            let gain = block.step();
            out_left[i] = in_left[i] * gain;
            out_right[i] = in_right[i] * gain;
        }
        block.hold_peak(out_left);
        block.hold_peak(out_right);

        self.finish_block(block)
    }

    /// Stereo processing for hosts that pass one buffer per channel
    pub fn process_stereo_in_place(
        &mut self,
        controls: ControlInputs,
        left: &mut [f32],
        right: &mut [f32],
    ) -> Option<f32> {
        nih_debug_assert_eq!(left.len(), right.len());
        let n = left.len().min(right.len());
        let (left, right) = (&mut left[..n], &mut right[..n]);

        let mut block = self.begin_block(controls, n);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let gain = block.step();
            *l *= gain;
            *r *= gain;
        }
        block.hold_peak(left);
        block.hold_peak(right);

        self.finish_block(block)
    }

    /// Decide whether the meter port needs a write
    ///
    /// Writes `0` once when the level falls to the floor, otherwise the linear
    /// level whenever it moved more than the hysteresis away from the last write.
    /// Never touches `meter_level` itself.
    pub fn report_meter_level(&mut self) -> Option<f32> {
        let level = self.meter_level;
        let level_db = if level > METER_FLOOR_LINEAR {
            20.0 * fast_log10(level)
        } else {
            METER_FLOOR_DB
        };

        if level_db == METER_FLOOR_DB && self.reported_db != METER_FLOOR_DB {
            self.reported_db = level_db;
            Some(0.0)
        } else if (level_db - self.reported_db).abs() > METER_THROTTLE_DB {
            self.reported_db = level_db;
            Some(level)
        } else {
            None
        }
    }

    fn begin_block(&mut self, controls: ControlInputs, n_samples: usize) -> BlockState {
        let block_size = u32::try_from(n_samples).unwrap_or(u32::MAX);
        self.refresh_parameters(controls.gain_db, block_size);

        // Bypass ramps to unity for this block only, the stored target stays
        let target = if controls.is_enabled() {
            self.target_gain
        } else {
            1.0
        };

        BlockState {
            level: (self.meter_level + LEVEL_EPSILON) * self.falloff,
            gain: self.gain + GAIN_EPSILON,
            target,
            omega: self.omega,
        }
    }

    fn finish_block(&mut self, block: BlockState) -> Option<f32> {
        self.meter_level = if block.level.is_finite() {
            block.level
        } else {
            0.0
        };
        self.gain = if block.gain.is_finite() {
            block.gain
        } else {
            0.0
        };

        self.report_meter_level()
    }
}
