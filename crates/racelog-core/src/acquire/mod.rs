//! Channel Acquisition
//!
//! Capabilities the populator reads channel values through. Each subsystem
//! (clock, analog inputs, IMU, timers, GPIO, PWM, GPS, lap statistics) is a
//! separate trait; [`SensorHub`] bundles them and is implemented for any type
//! that provides all of them.
//!
//! Every read is expected to be a non-blocking read of already latched state.
//! A read that has nothing to report returns `None`, which leaves the
//! corresponding record entry untouched for that tick.

mod source;

pub use source::{Acquisition, FloatSource, IndexedFloatSource, IndexedIntSource, IntSource, LongSource};

/// System time sources
pub trait Clock {
    /// Milliseconds since boot
    fn uptime_ms(&self) -> Option<i32>;

    /// Milliseconds since the Unix epoch, 0 when no time fix is available
    fn utc_millis(&self) -> Option<i64>;

    /// Minutes since the logging session started
    fn elapsed_minutes(&self) -> Option<f32>;
}

/// Analog inputs, already scaled to engineering units
pub trait AnalogInputs {
    /// Value of one analog input
    fn analog(&self, channel: u8) -> Option<f32>;
}

/// Inertial measurement unit
pub trait Imu {
    /// Value of one configured axis
    fn imu_axis(&self, channel: u8) -> Option<f32>;

    /// Combined lateral and longitudinal acceleration
    fn gsum(&self) -> Option<f32>;

    /// Peak g-sum this session
    fn gsum_max(&self) -> Option<f32>;

    /// Share of samples spent near the g-sum peak, in percent
    fn gsum_pct(&self) -> Option<f32>;
}

/// Timer (frequency/period) inputs
pub trait Timers {
    /// Value of one timer input in its configured unit
    fn timer(&self, channel: u8) -> Option<f32>;
}

/// Digital inputs
pub trait Gpio {
    /// Pin state, 0 or 1
    fn gpio(&self, channel: u8) -> Option<i32>;
}

/// PWM outputs
pub trait Pwm {
    /// Current output value
    fn pwm(&self, channel: u8) -> Option<i32>;
}

/// Latest satellite positioning fix
pub trait Gps {
    /// Latitude in decimal degrees
    fn latitude(&self) -> Option<f32>;
    /// Longitude in decimal degrees
    fn longitude(&self) -> Option<f32>;
    /// Ground speed in mph
    fn speed_mph(&self) -> Option<f32>;
    /// Altitude in feet
    fn altitude_ft(&self) -> Option<f32>;
    /// Satellites in use
    fn satellites(&self) -> Option<i32>;
    /// Fix quality indicator
    fn quality(&self) -> Option<i32>;
    /// Dilution of precision
    fn dop(&self) -> Option<f32>;
}

/// Lap, sector and session statistics
pub trait LapStats {
    /// Laps completed this session
    fn lap_count(&self) -> Option<i32>;
    /// Time of the last completed lap
    fn last_lap_minutes(&self) -> Option<f32>;
    /// Current sector index, -1 before the first sector boundary
    fn sector(&self) -> Option<i32>;
    /// Time of the last completed sector
    fn last_sector_minutes(&self) -> Option<f32>;
    /// Predicted time for the current lap
    fn predicted_minutes(&self) -> Option<f32>;
    /// Lap in progress, counting from 1
    fn current_lap(&self) -> Option<i32>;
    /// Lap distance in miles
    fn distance_miles(&self) -> Option<f32>;
    /// Time since the session started
    fn session_minutes(&self) -> Option<f32>;
}

/// Every capability the populator needs
pub trait SensorHub: Clock + AnalogInputs + Imu + Timers + Gpio + Pwm + Gps + LapStats {}

impl<T> SensorHub for T where T: Clock + AnalogInputs + Imu + Timers + Gpio + Pwm + Gps + LapStats {}
