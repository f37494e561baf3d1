//! Sample record building, population and lookup

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, trace};

use super::{ChannelSample, SampleSnapshot, SampleValue};
use crate::acquire::{
    Acquisition, FloatSource, IndexedFloatSource, IndexedIntSource, IntSource, LongSource, SensorHub,
};
use crate::config::{enabled_channel_count, ChannelConfig, ConfigError, LoggerConfig, SampleRate, TickRate, TimeType};

/// Outcome of one populate pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// At least one rate-limited channel was due; carries the fastest rate
    /// sampled this tick
    Sampled(SampleRate),
    /// Rate-limited channels exist but none were due this tick
    Skipped,
    /// No rate-limited channel is enabled
    Disabled,
}

impl Cycle {
    /// Whether any rate-limited channel was refreshed
    pub fn is_sampled(&self) -> bool {
        matches!(self, Cycle::Sampled(_))
    }
}

/// Result of a lookup by channel label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading<'cfg> {
    /// Current value widened to a double
    pub value: f64,
    /// Configured units
    pub units: &'cfg str,
}

/// The ordered set of channel samples for one configuration epoch
///
/// Entries borrow their configuration, so a configuration change means
/// building a new record. Entry order and count never change after build.
#[derive(Debug)]
pub struct SampleRecord<'cfg> {
    entries: Vec<ChannelSample<'cfg>>,
    tick_rate: TickRate,
    /// Tick of the last populate pass
    ticks: AtomicU32,
}

impl<'cfg> SampleRecord<'cfg> {
    /// Build the record for a configuration
    ///
    /// Entry order:
    /// 1. Interval, UTC and elapsed time (always present)
    /// 2. Analog, then IMU axis channels
    /// 3. G-sum, g-sum max and g-sum percentage (always present)
    /// 4. Timer, GPIO and PWM channels
    /// 5. GPS fields, then lap and session statistics
    ///
    /// Every entry other than the six structural ones is skipped when its
    /// sample rate is disabled.
    pub fn build(config: &'cfg LoggerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let uptime = config
            .time_channel(TimeType::Uptime)
            .ok_or(ConfigError::MissingTimeChannel(TimeType::Uptime))?;
        let utc = config
            .time_channel(TimeType::UtcMillis)
            .ok_or(ConfigError::MissingTimeChannel(TimeType::UtcMillis))?;

        let mut entries = Vec::with_capacity(enabled_channel_count(config));

        entries.push(ChannelSample::new(0, &uptime.cfg, Acquisition::IntNoArg(IntSource::Uptime)).always_sampled());
        entries.push(
            ChannelSample::new(0, &utc.cfg, Acquisition::LongLongNoArg(LongSource::UtcMillis)).always_sampled(),
        );
        entries.push(
            ChannelSample::new(0, &config.lap.elapsed_time, Acquisition::FloatNoArg(FloatSource::ElapsedTime))
                .always_sampled(),
        );

        push_indexed(
            &mut entries,
            config.analog.iter().map(|a| &a.cfg),
            Acquisition::Float(IndexedFloatSource::Analog),
        );
        push_indexed(
            &mut entries,
            config.imu.iter().map(|i| &i.cfg),
            Acquisition::Float(IndexedFloatSource::Imu),
        );

        entries.push(ChannelSample::new(0, &config.imu_gsum, Acquisition::FloatNoArg(FloatSource::ImuGsum)));
        entries.push(ChannelSample::new(
            0,
            &config.imu_gsum_max,
            Acquisition::FloatNoArg(FloatSource::ImuGsumMax),
        ));
        entries.push(ChannelSample::new(
            0,
            &config.imu_gsum_pct,
            Acquisition::FloatNoArg(FloatSource::ImuGsumPct),
        ));

        push_indexed(
            &mut entries,
            config.timers.iter().map(|t| &t.cfg),
            Acquisition::Float(IndexedFloatSource::Timer),
        );
        push_indexed(
            &mut entries,
            config.gpio.iter().map(|g| &g.cfg),
            Acquisition::Int(IndexedIntSource::Gpio),
        );
        push_indexed(
            &mut entries,
            config.pwm.iter().map(|p| &p.cfg),
            Acquisition::Int(IndexedIntSource::Pwm),
        );

        let gps = &config.gps;
        push_optional(
            &mut entries,
            [
                (&gps.latitude, Acquisition::FloatNoArg(FloatSource::GpsLatitude)),
                (&gps.longitude, Acquisition::FloatNoArg(FloatSource::GpsLongitude)),
                (&gps.speed, Acquisition::FloatNoArg(FloatSource::GpsSpeed)),
                (&gps.altitude, Acquisition::FloatNoArg(FloatSource::GpsAltitude)),
                (&gps.satellites, Acquisition::IntNoArg(IntSource::GpsSatellites)),
                (&gps.quality, Acquisition::IntNoArg(IntSource::GpsQuality)),
                (&gps.dop, Acquisition::FloatNoArg(FloatSource::GpsDop)),
            ],
        );

        let lap = &config.lap;
        push_optional(
            &mut entries,
            [
                (&lap.lap_count, Acquisition::IntNoArg(IntSource::LapCount)),
                (&lap.lap_time, Acquisition::FloatNoArg(FloatSource::LastLapTime)),
                (&lap.sector, Acquisition::IntNoArg(IntSource::Sector)),
                (&lap.sector_time, Acquisition::FloatNoArg(FloatSource::LastSectorTime)),
                (&lap.predicted_time, Acquisition::FloatNoArg(FloatSource::PredictedTime)),
                (&lap.current_lap, Acquisition::IntNoArg(IntSource::CurrentLap)),
                (&lap.distance, Acquisition::FloatNoArg(FloatSource::Distance)),
                (&lap.session_time, Acquisition::FloatNoArg(FloatSource::SessionTime)),
            ],
        );

        debug_assert_eq!(entries.len(), enabled_channel_count(config));
        debug!(channels = entries.len(), tick_rate = config.tick_rate.hz(), "built sample record");

        Ok(Self {
            entries,
            tick_rate: config.tick_rate,
            ticks: AtomicU32::new(0),
        })
    }

    /// Refresh the record for one scheduler tick
    ///
    /// Time entries are refreshed on every call. All other entries are
    /// refreshed only on ticks that are a multiple of their decimation
    /// interval. A channel whose acquisition has no value keeps its previous
    /// value and stamp; the rest of the pass proceeds. The record tick is
    /// stored after every entry has been processed.
    pub fn populate<S: SensorHub + ?Sized>(&self, sensors: &S, tick: u32) -> Cycle {
        let mut highest = SampleRate::Disabled;
        let mut scheduled = false;

        for sample in &self.entries {
            if !sample.is_always_sampled() {
                let rate = sample.config().sample_rate;
                if rate == SampleRate::Disabled {
                    continue;
                }
                scheduled = true;
                if !rate.is_due(tick, self.tick_rate) {
                    continue;
                }
                highest = highest.higher(rate);
            }

            if !sample.refresh(sensors, tick) {
                trace!(channel = sample.label(), tick, "no value acquired");
            }
        }

        self.ticks.store(tick, Ordering::Release);

        match (highest, scheduled) {
            (SampleRate::Disabled, true) => Cycle::Skipped,
            (SampleRate::Disabled, false) => Cycle::Disabled,
            (rate, _) => Cycle::Sampled(rate),
        }
    }

    /// Current value and units of the first channel with the given label
    ///
    /// Scans in record order. Returns `None` when no channel matches, which is
    /// an ordinary outcome for ad-hoc queries.
    pub fn lookup(&self, name: &str) -> Option<ChannelReading<'cfg>> {
        self.entries
            .iter()
            .find(|sample| sample.label() == name)
            .map(|sample| ChannelReading {
                value: sample.value().as_f64(),
                units: sample.units(),
            })
    }

    /// Typed value of the first channel with the given label
    pub fn value_of(&self, name: &str) -> Option<SampleValue> {
        self.get(name).map(|sample| sample.value())
    }

    /// First entry with the given label
    pub fn get(&self, name: &str) -> Option<&ChannelSample<'cfg>> {
        self.entries.iter().find(|sample| sample.label() == name)
    }

    /// Entries in record order
    pub fn entries(&self) -> &[ChannelSample<'cfg>] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tick of the most recent populate pass
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Scheduler tick rate the record decimates against
    pub fn tick_rate(&self) -> TickRate {
        self.tick_rate
    }

    /// Whether both records hold the same entries in the same order with the
    /// same bindings
    pub fn same_layout(&self, other: &SampleRecord<'_>) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.same_binding(b))
    }

    /// Copy the current values into an owned snapshot
    pub fn snapshot(&self) -> SampleSnapshot {
        SampleSnapshot::capture(self)
    }
}

fn push_indexed<'cfg>(
    entries: &mut Vec<ChannelSample<'cfg>>,
    configs: impl Iterator<Item = &'cfg ChannelConfig>,
    acquisition: Acquisition,
) {
    for (index, cfg) in configs.enumerate() {
        if cfg.is_enabled() {
            // Group sizes are bounded by validation
            entries.push(ChannelSample::new(index as u8, cfg, acquisition));
        }
    }
}

fn push_optional<'cfg, const N: usize>(
    entries: &mut Vec<ChannelSample<'cfg>>,
    channels: [(&'cfg ChannelConfig, Acquisition); N],
) {
    for (cfg, acquisition) in channels {
        if cfg.is_enabled() {
            entries.push(ChannelSample::new(0, cfg, acquisition));
        }
    }
}
