//! Acquisition bindings
//!
//! A record entry is bound to exactly one [`Acquisition`]. The variant fixes
//! both the value representation and whether the read takes a channel index.

use serde::{Deserialize, Serialize};

use super::SensorHub;
use crate::sample::{SampleDataKind, SampleValue};

/// Indexed integer reads shared by every channel of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexedIntSource {
    /// Digital input state
    Gpio,
    /// PWM output value
    Pwm,
}

/// Integer reads bound to a single quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntSource {
    /// Milliseconds since boot
    Uptime,
    /// Satellites in use
    GpsSatellites,
    /// Fix quality
    GpsQuality,
    /// Completed laps
    LapCount,
    /// Current sector
    Sector,
    /// Lap in progress
    CurrentLap,
}

/// Indexed float reads shared by every channel of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexedFloatSource {
    /// Scaled analog input
    Analog,
    /// IMU axis
    Imu,
    /// Timer input
    Timer,
}

/// Float reads bound to a single quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatSource {
    /// Minutes since logging started
    ElapsedTime,
    /// Combined acceleration
    ImuGsum,
    /// Peak combined acceleration
    ImuGsumMax,
    /// Combined acceleration as a share of the peak
    ImuGsumPct,
    /// Latitude
    GpsLatitude,
    /// Longitude
    GpsLongitude,
    /// Ground speed
    GpsSpeed,
    /// Altitude
    GpsAltitude,
    /// Dilution of precision
    GpsDop,
    /// Last lap time
    LastLapTime,
    /// Last sector time
    LastSectorTime,
    /// Predicted lap time
    PredictedTime,
    /// Lap distance
    Distance,
    /// Session time
    SessionTime,
}

/// 64-bit integer reads bound to a single quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongSource {
    /// Wall clock, ms since the Unix epoch
    UtcMillis,
}

/// How a record entry obtains its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acquisition {
    /// Integer read taking the channel index
    Int(IndexedIntSource),
    /// Integer read of a single quantity
    IntNoArg(IntSource),
    /// Float read taking the channel index
    Float(IndexedFloatSource),
    /// Float read of a single quantity
    FloatNoArg(FloatSource),
    /// 64-bit integer read of a single quantity
    LongLongNoArg(LongSource),
}

impl Acquisition {
    /// The value kind and calling convention of this binding
    pub fn kind(&self) -> SampleDataKind {
        match self {
            Acquisition::Int(_) => SampleDataKind::Int,
            Acquisition::IntNoArg(_) => SampleDataKind::IntNoArg,
            Acquisition::Float(_) => SampleDataKind::Float,
            Acquisition::FloatNoArg(_) => SampleDataKind::FloatNoArg,
            Acquisition::LongLongNoArg(_) => SampleDataKind::LongLongNoArg,
        }
    }

    /// Read the bound quantity. `channel` is only passed to indexed sources.
    pub fn read<S: SensorHub + ?Sized>(&self, sensors: &S, channel: u8) -> Option<SampleValue> {
        match *self {
            Acquisition::Int(source) => source.read(sensors, channel).map(SampleValue::Int),
            Acquisition::IntNoArg(source) => source.read(sensors).map(SampleValue::Int),
            Acquisition::Float(source) => source.read(sensors, channel).map(SampleValue::Float),
            Acquisition::FloatNoArg(source) => source.read(sensors).map(SampleValue::Float),
            Acquisition::LongLongNoArg(source) => source.read(sensors).map(SampleValue::LongLong),
        }
    }
}

impl IndexedIntSource {
    /// Read one channel of the group
    pub fn read<S: SensorHub + ?Sized>(self, sensors: &S, channel: u8) -> Option<i32> {
        match self {
            IndexedIntSource::Gpio => sensors.gpio(channel),
            IndexedIntSource::Pwm => sensors.pwm(channel),
        }
    }
}

impl IntSource {
    /// Read the bound quantity
    pub fn read<S: SensorHub + ?Sized>(self, sensors: &S) -> Option<i32> {
        match self {
            IntSource::Uptime => sensors.uptime_ms(),
            IntSource::GpsSatellites => sensors.satellites(),
            IntSource::GpsQuality => sensors.quality(),
            IntSource::LapCount => sensors.lap_count(),
            IntSource::Sector => sensors.sector(),
            IntSource::CurrentLap => sensors.current_lap(),
        }
    }
}

impl IndexedFloatSource {
    /// Read one channel of the group
    pub fn read<S: SensorHub + ?Sized>(self, sensors: &S, channel: u8) -> Option<f32> {
        match self {
            IndexedFloatSource::Analog => sensors.analog(channel),
            IndexedFloatSource::Imu => sensors.imu_axis(channel),
            IndexedFloatSource::Timer => sensors.timer(channel),
        }
    }
}

impl FloatSource {
    /// Read the bound quantity
    pub fn read<S: SensorHub + ?Sized>(self, sensors: &S) -> Option<f32> {
        match self {
            FloatSource::ElapsedTime => sensors.elapsed_minutes(),
            FloatSource::ImuGsum => sensors.gsum(),
            FloatSource::ImuGsumMax => sensors.gsum_max(),
            FloatSource::ImuGsumPct => sensors.gsum_pct(),
            FloatSource::GpsLatitude => sensors.latitude(),
            FloatSource::GpsLongitude => sensors.longitude(),
            FloatSource::GpsSpeed => sensors.speed_mph(),
            FloatSource::GpsAltitude => sensors.altitude_ft(),
            FloatSource::GpsDop => sensors.dop(),
            FloatSource::LastLapTime => sensors.last_lap_minutes(),
            FloatSource::LastSectorTime => sensors.last_sector_minutes(),
            FloatSource::PredictedTime => sensors.predicted_minutes(),
            FloatSource::Distance => sensors.distance_miles(),
            FloatSource::SessionTime => sensors.session_minutes(),
        }
    }
}

impl LongSource {
    /// Read the bound quantity
    pub fn read<S: SensorHub + ?Sized>(self, sensors: &S) -> Option<i64> {
        match self {
            LongSource::UtcMillis => sensors.utc_millis(),
        }
    }
}
