use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Meter port written by the audio thread
///
/// Only receives values that made it through the processor's throttle, so a
/// slow or polling reader is not flooded with near-identical levels.
#[derive(Clone)]
pub struct MeterProducer {
    /// Last written linear level
    level: Arc<AtomicF32>,
    /// Bumped on every write so readers can tell a fresh value from a stale one
    writes: Arc<AtomicU32>,
}

impl MeterProducer {
    /// Forward a throttled meter update (called from audio thread)
    /// Must be real-time safe - no allocations or locks
    pub fn publish(&self, update: Option<f32>) {
        if let Some(level) = update {
            self.level.store(level, Ordering::Relaxed);
            self.writes.fetch_add(1, Ordering::Release);
        }
    }
}

/// Reader side of the meter port (host or UI thread)
pub struct MeterConsumer {
    meter: MeterProducer,
    /// Write count seen by the last `poll()`
    last_seen: u32,
}

impl MeterConsumer {
    fn new(meter: MeterProducer) -> Self {
        Self {
            meter,
            last_seen: 0,
        }
    }

    /// Current port value, whether or not it changed
    pub fn level(&self) -> f32 {
        self.meter.level.load(Ordering::Relaxed)
    }

    /// Total number of port writes so far
    pub fn write_count(&self) -> u32 {
        self.meter.writes.load(Ordering::Acquire)
    }

    /// Returns the level only if the port was written since the last poll
    pub fn poll(&mut self) -> Option<f32> {
        let writes = self.write_count();
        if writes == self.last_seen {
            return None;
        }

        self.last_seen = writes;
        Some(self.level())
    }
}

/// Factory function to create the meter port
/// Returns (producer for audio thread, consumer for the reader)
pub fn create_meter_channels() -> (MeterProducer, MeterConsumer) {
    let producer = MeterProducer {
        level: Arc::new(AtomicF32::new(0.0)),
        writes: Arc::new(AtomicU32::new(0)),
    };
    let consumer = MeterConsumer::new(producer.clone());

    (producer, consumer)
}

/// Utility functions for the level readout
pub mod display_utils {
    use crate::audio::constants::{METER_FLOOR_LINEAR, ZONE_CLIP_DB, ZONE_HOT_DB, ZONE_WARM_DB};

    /// Readout zone for a meter value, from safe to clipping
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MeterZone {
        Normal,
        Warm,
        Hot,
        Clip,
    }

    impl MeterZone {
        pub fn from_level(level: f32) -> Self {
            if level < METER_FLOOR_LINEAR {
                return MeterZone::Normal;
            }

            let level_db = 20.0 * level.log10();
            if level_db < ZONE_WARM_DB {
                MeterZone::Normal
            } else if level_db < ZONE_HOT_DB {
                MeterZone::Warm
            } else if level_db < ZONE_CLIP_DB {
                MeterZone::Hot
            } else {
                MeterZone::Clip
            }
        }
    }

    /// Format a linear meter value as dB with one decimal, "-inf" below the floor
    pub fn level_to_db_text(level: f32) -> String {
        if level < METER_FLOOR_LINEAR {
            return String::from("-inf");
        }

        format!("{:.1}", 20.0 * level.log10())
    }
}

#[cfg(test)]
mod tests {
    use super::display_utils::{level_to_db_text, MeterZone};
    use super::*;

    #[test]
    fn suppressed_updates_are_not_written() {
        let (producer, mut consumer) = create_meter_channels();
        producer.publish(None);
        assert_eq!(consumer.write_count(), 0);
        assert_eq!(consumer.poll(), None);
    }

    #[test]
    fn poll_sees_each_write_once() {
        let (producer, mut consumer) = create_meter_channels();
        producer.publish(Some(0.5));
        assert_eq!(consumer.poll(), Some(0.5));
        assert_eq!(consumer.poll(), None);
        assert_eq!(consumer.level(), 0.5);

        producer.publish(Some(0.0));
        assert_eq!(consumer.poll(), Some(0.0));
        assert_eq!(consumer.write_count(), 2);
    }

    #[test]
    fn producer_clones_share_the_port() {
        let (producer, consumer) = create_meter_channels();
        let audio_side = producer.clone();
        audio_side.publish(Some(0.25));
        assert_eq!(consumer.level(), 0.25);
    }

    #[test]
    fn db_text() {
        assert_eq!(level_to_db_text(0.0), "-inf");
        assert_eq!(level_to_db_text(5e-7), "-inf");
        assert_eq!(level_to_db_text(1.0), "0.0");
        assert_eq!(level_to_db_text(0.1), "-20.0");
    }

    #[test]
    fn zones() {
        assert_eq!(MeterZone::from_level(0.0), MeterZone::Normal);
        assert_eq!(MeterZone::from_level(0.5), MeterZone::Normal);
        assert_eq!(MeterZone::from_level(0.8), MeterZone::Warm);
        assert_eq!(MeterZone::from_level(0.95), MeterZone::Hot);
        assert_eq!(MeterZone::from_level(1.0), MeterZone::Clip);
        assert_eq!(MeterZone::from_level(1.5), MeterZone::Clip);
    }
}
