pub mod audio;

use audio::constants::{GAIN_MAX_DB, GAIN_MIN_DB};
use audio::gain_processor::{ControlInputs, GainProcessor};
use audio::meter_communication::{create_meter_channels, MeterConsumer, MeterProducer};
use nih_plug::prelude::*;
use std::sync::Arc;

/// Channel configuration of an activated instance, never switched while processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Matches 1-in/1-out and 2-in/2-out, anything else is unsupported
    pub fn from_io_layout(layout: &AudioIOLayout) -> Option<Self> {
        let inputs = layout.main_input_channels.map(NonZeroU32::get);
        let outputs = layout.main_output_channels.map(NonZeroU32::get);

        match (inputs, outputs) {
            (Some(1), Some(1)) => Some(ChannelLayout::Mono),
            (Some(2), Some(2)) => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

pub struct TinyGain {
    params: Arc<TinyGainParams>,
    layout: ChannelLayout,

    /// Created in `initialize()` once the sample rate is known
    processor: Option<GainProcessor>,

    /// Meter level output port (audio thread side)
    meter: MeterProducer,
    /// Reader side, handed out once to whoever displays the level
    meter_consumer: Option<MeterConsumer>,
}

#[derive(Params)]
pub struct TinyGainParams {
    /// Gain request in decibels. No smoother here, the processor ramps the gain itself
    #[id = "gain"]
    pub gain: FloatParam,

    /// When off, the gain ramps back to unity without forgetting the requested gain
    #[id = "enable"]
    pub enable: BoolParam,
}

impl Default for TinyGain {
    fn default() -> Self {
        let (meter, meter_consumer) = create_meter_channels();

        Self {
            params: Arc::new(TinyGainParams::default()),
            layout: ChannelLayout::Stereo,
            processor: None,
            meter,
            meter_consumer: Some(meter_consumer),
        }
    }
}

impl Default for TinyGainParams {
    fn default() -> Self {
        Self {
            gain: FloatParam::new(
                "Gain",
                0.0,
                FloatRange::Linear {
                    min: GAIN_MIN_DB,
                    max: GAIN_MAX_DB,
                },
            )
            .with_step_size(0.1)
            .with_unit(" dB"),
            enable: BoolParam::new("Enable", true),
        }
    }
}

impl TinyGain {
    /// Take the reader side of the meter port. Returns `None` after the first call
    pub fn take_meter_consumer(&mut self) -> Option<MeterConsumer> {
        self.meter_consumer.take()
    }

    fn controls(&self) -> ControlInputs {
        ControlInputs::new(self.params.gain.value(), self.params.enable.value())
    }
}

impl Plugin for TinyGain {
    const NAME: &'static str = "Tiny Gain";
    const VENDOR: &'static str = "Cmdv";
    const URL: &'static str = env!("CARGO_PKG_HOMEPAGE");
    const EMAIL: &'static str = "info@cmdv.me";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo is the default, mono is offered as the alternative layout
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),

            aux_input_ports: &[],
            aux_output_ports: &[],

            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),

            aux_input_ports: &[],
            aux_output_ports: &[],

            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const MIDI_OUTPUT: MidiConfig = MidiConfig::None;

    // Parameters are picked up once per block
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let Some(layout) = ChannelLayout::from_io_layout(audio_io_layout) else {
            nih_plug::nih_log!(
                "Unsupported channel layout: {:?} in, {:?} out",
                audio_io_layout.main_input_channels,
                audio_io_layout.main_output_channels
            );
            return false;
        };

        if buffer_config.sample_rate <= 0.0 {
            nih_plug::nih_log!("Invalid sample rate: {}", buffer_config.sample_rate);
            return false;
        }

        nih_plug::nih_log!(
            "Plugin initialize called, sample_rate: {}, layout: {:?}, buffer_size: {}",
            buffer_config.sample_rate,
            layout,
            buffer_config.max_buffer_size
        );

        self.layout = layout;
        self.processor = Some(GainProcessor::new(buffer_config.sample_rate));
        true
    }

    fn reset(&mut self) {
        // Called from the audio thread, `GainProcessor::new()` does not allocate
        if let Some(processor) = self.processor.as_mut() {
            *processor = GainProcessor::new(processor.rate_hz());
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let controls = self.controls();
        let Some(processor) = self.processor.as_mut() else {
            return ProcessStatus::Normal;
        };

        let update = match (self.layout, buffer.as_slice()) {
            (ChannelLayout::Mono, [mono, ..]) => processor.process_mono_in_place(controls, mono),
            (ChannelLayout::Stereo, [left, right, ..]) => {
                processor.process_stereo_in_place(controls, left, right)
            }
            _ => None,
        };
        self.meter.publish(update);

        ProcessStatus::Normal
    }

    fn deactivate(&mut self) {
        if let Some(processor) = self.processor.take() {
            nih_plug::nih_log!(
                "Plugin deactivated, last meter level: {}",
                processor.meter_level()
            );
        }
    }
}

impl ClapPlugin for TinyGain {
    const CLAP_ID: &'static str = "me.cmdv.tinygain";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Smoothed gain stage with a throttled peak level meter");
    const CLAP_MANUAL_URL: Option<&'static str> = Some(Self::URL);
    const CLAP_SUPPORT_URL: Option<&'static str> = None;

    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Mono,
        ClapFeature::Stereo,
        ClapFeature::Utility,
    ];
}

impl Vst3Plugin for TinyGain {
    const VST3_CLASS_ID: [u8; 16] = *b"TinyGainMeterV01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Tools];
}

nih_export_clap!(TinyGain);
nih_export_vst3!(TinyGain);
