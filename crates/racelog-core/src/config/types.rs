//! Shared configuration types
//!
//! Defines the per-channel configuration entry and the rate types used for
//! decimation.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Maximum label length accepted for a channel
pub const DEFAULT_LABEL_LENGTH: usize = 16;

/// Maximum units length accepted for a channel
pub const DEFAULT_UNITS_LENGTH: usize = 8;

/// Configuration common to every channel, regardless of group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel label, used for lookup and display
    pub label: String,

    /// Unit of measurement
    pub units: String,

    /// How often the channel is sampled; `Disabled` removes it from the record
    pub sample_rate: SampleRate,

    /// Display precision (digits after the decimal point)
    #[serde(default)]
    pub precision: u8,

    /// Display range minimum
    #[serde(default)]
    pub min: f32,

    /// Display range maximum
    #[serde(default)]
    pub max: f32,
}

impl ChannelConfig {
    /// Create a new channel configuration
    pub fn new(label: impl Into<String>, units: impl Into<String>, sample_rate: SampleRate) -> Self {
        Self {
            label: label.into(),
            units: units.into(),
            sample_rate,
            precision: 0,
            min: 0.0,
            max: 0.0,
        }
    }

    /// Set the display precision and range
    pub fn with_display(mut self, precision: u8, min: f32, max: f32) -> Self {
        self.precision = precision;
        self.min = min;
        self.max = max;
        self
    }

    /// Check if this channel takes part in sample records
    pub fn is_enabled(&self) -> bool {
        self.sample_rate != SampleRate::Disabled
    }
}

/// Channel sample rate
///
/// Serialized as the rate in Hz, with 0 meaning disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum SampleRate {
    /// Channel is not sampled
    Disabled,
    /// 1 Hz
    Hz1,
    /// 5 Hz
    Hz5,
    /// 10 Hz
    Hz10,
    /// 25 Hz
    Hz25,
    /// 50 Hz
    Hz50,
    /// 100 Hz
    Hz100,
    /// 200 Hz
    Hz200,
    /// 500 Hz
    Hz500,
    /// 1000 Hz
    Hz1000,
}

impl SampleRate {
    /// All enabled rates, slowest first
    pub const ENABLED: [SampleRate; 9] = [
        SampleRate::Hz1,
        SampleRate::Hz5,
        SampleRate::Hz10,
        SampleRate::Hz25,
        SampleRate::Hz50,
        SampleRate::Hz100,
        SampleRate::Hz200,
        SampleRate::Hz500,
        SampleRate::Hz1000,
    ];

    /// Rate in Hz (0 for disabled)
    pub fn hz(self) -> u16 {
        match self {
            SampleRate::Disabled => 0,
            SampleRate::Hz1 => 1,
            SampleRate::Hz5 => 5,
            SampleRate::Hz10 => 10,
            SampleRate::Hz25 => 25,
            SampleRate::Hz50 => 50,
            SampleRate::Hz100 => 100,
            SampleRate::Hz200 => 200,
            SampleRate::Hz500 => 500,
            SampleRate::Hz1000 => 1000,
        }
    }

    /// Number of ticks between samples at the given tick rate
    ///
    /// Returns `None` for a disabled channel. Rates faster than the tick rate
    /// sample every tick.
    pub fn interval_ticks(self, tick_rate: TickRate) -> Option<u32> {
        match self.hz() {
            0 => None,
            hz => Some((tick_rate.hz() / u32::from(hz)).max(1)),
        }
    }

    /// Whether a channel at this rate is due on the given tick
    pub fn is_due(self, tick: u32, tick_rate: TickRate) -> bool {
        self.interval_ticks(tick_rate)
            .is_some_and(|interval| tick % interval == 0)
    }

    /// The faster of two rates
    pub fn higher(self, other: SampleRate) -> SampleRate {
        self.max(other)
    }
}

impl TryFrom<u16> for SampleRate {
    type Error = ConfigError;

    fn try_from(hz: u16) -> Result<Self, Self::Error> {
        if hz == 0 {
            return Ok(SampleRate::Disabled);
        }
        SampleRate::ENABLED
            .into_iter()
            .find(|rate| rate.hz() == hz)
            .ok_or(ConfigError::InvalidSampleRate(hz))
    }
}

impl From<SampleRate> for u16 {
    fn from(rate: SampleRate) -> Self {
        rate.hz()
    }
}

/// Scheduler tick frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TickRate(u32);

impl TickRate {
    /// Create a tick rate, rejecting zero and rates that do not divide a second
    /// into whole milliseconds
    pub fn new(hz: u32) -> Result<Self, ConfigError> {
        if hz == 0 || hz > 1000 || 1000 % hz != 0 {
            return Err(ConfigError::InvalidTickRate(hz));
        }
        Ok(Self(hz))
    }

    /// Tick rate in Hz
    pub fn hz(self) -> u32 {
        self.0
    }

    /// Milliseconds per tick
    pub fn ms_per_tick(self) -> u32 {
        1000 / self.0
    }

    /// Convert a tick count to milliseconds
    pub fn ticks_to_ms(self, ticks: u32) -> u64 {
        u64::from(ticks) * u64::from(self.ms_per_tick())
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self(1000)
    }
}

impl TryFrom<u32> for TickRate {
    type Error = ConfigError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        TickRate::new(hz)
    }
}

impl From<TickRate> for u32 {
    fn from(rate: TickRate) -> Self {
        rate.0
    }
}

/// Kind of time a time channel reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeType {
    /// Milliseconds since boot
    Uptime,
    /// Milliseconds since the Unix epoch
    UtcMillis,
}

/// How raw analog readings are converted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalingMode {
    /// Plain voltage at the input pin
    Raw,
    /// Voltage scaled linearly
    Linear {
        /// Multiplier applied to the pin voltage
        scale: f32,
        /// Added after scaling
        offset: f32,
    },
}

/// Accelerometer counts per G
pub const IMU_ACCEL_COUNTS_PER_G: f32 = 1024.0;

/// Gyro counts per degree per second
pub const IMU_GYRO_COUNTS_PER_DEG_SEC: f32 = 16.0;

/// Inertial axis reported by an IMU channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImuAxis {
    /// Lateral acceleration
    X,
    /// Longitudinal acceleration
    Y,
    /// Vertical acceleration
    Z,
    /// Rotation about the vertical axis
    Yaw,
    /// Rotation about the lateral axis
    Pitch,
    /// Rotation about the longitudinal axis
    Roll,
}

impl ImuAxis {
    /// Whether the axis is an accelerometer axis
    pub fn is_accel(self) -> bool {
        matches!(self, ImuAxis::X | ImuAxis::Y | ImuAxis::Z)
    }

    /// Raw sensor counts per engineering unit
    pub fn counts_per_unit(self) -> f32 {
        if self.is_accel() {
            IMU_ACCEL_COUNTS_PER_G
        } else {
            IMU_GYRO_COUNTS_PER_DEG_SEC
        }
    }
}

/// What a timer channel reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerMode {
    /// Engine speed
    Rpm,
    /// Pulse frequency in Hz
    Frequency,
    /// Pulse period in milliseconds
    PeriodMs,
    /// Pulse period in microseconds
    PeriodUsec,
}

/// GPIO direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpioMode {
    /// Read the pin
    Input,
    /// Drive the pin
    Output,
}

/// PWM output behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PwmOutputMode {
    /// Fixed frequency, variable duty cycle
    Duty,
    /// Fixed duty cycle, variable frequency
    Frequency,
}
