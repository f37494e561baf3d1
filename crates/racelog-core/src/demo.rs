//! Demo Mode - Simulated sensors for bench testing
//!
//! Generates plausible logger inputs without hardware: a car lapping a
//! circular track with varying pace, a charging system on the battery input
//! and an IMU that follows the cornering load.
//!
//! Analog, IMU and timer inputs are produced as raw hardware readings and
//! converted through the channel configuration, so scaling, zero offsets and
//! axis mapping behave as they would on the logger.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::acquire::{AnalogInputs, Clock, Gpio, Gps, Imu, LapStats, Pwm, Timers};
use crate::config::{
    AnalogConfig, ImuConfig, LoggerConfig, PwmConfig, TimerConfig, ADC_MAX_COUNTS, ADC_VOLTAGE_SCALING,
    BATTERY_DIVIDER_SCALE,
};

/// Track radius in meters
const TRACK_RADIUS_M: f64 = 400.0;
/// Track centre
const TRACK_LAT: f64 = 47.2551;
const TRACK_LON: f64 = -123.1917;
const METERS_PER_DEG_LAT: f64 = 111_320.0;
const METERS_PER_MILE: f64 = 1609.344;
const MPS_TO_MPH: f64 = 2.236_936;
const SECTORS_PER_LAP: i32 = 3;

/// Simulated sensor suite implementing every acquisition capability
pub struct DemoSensors {
    analog: Vec<AnalogConfig>,
    imu: Vec<ImuConfig>,
    timers: Vec<TimerConfig>,
    pwm: Vec<PwmConfig>,
    /// Wall clock at simulation start, ms since epoch
    utc_start_ms: i64,
    /// Simulation time, ms
    now_ms: u64,
    /// Distance covered this lap, meters
    lap_distance_m: f64,
    /// Ground speed, m/s
    speed_mps: f64,
    /// Pace multiplier for the current lap
    lap_pace: f64,
    lap_count: i32,
    lap_start_ms: u64,
    last_lap_ms: Option<u64>,
    sector: i32,
    sector_start_ms: u64,
    last_sector_ms: Option<u64>,
    /// Longitudinal acceleration, g
    accel_long_g: f64,
    gsum_max: f64,
    /// Random number generator (seedable for reproducible runs)
    rng: StdRng,
}

impl Default for DemoSensors {
    fn default() -> Self {
        Self::new(&LoggerConfig::default())
    }
}

impl DemoSensors {
    /// Create a simulator seeded from entropy and anchored to the current time
    pub fn new(config: &LoggerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy(), Utc::now().timestamp_millis())
    }

    /// Create a reproducible simulator
    pub fn seeded(config: &LoggerConfig, seed: u64, utc_start_ms: i64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed), utc_start_ms)
    }

    fn with_rng(config: &LoggerConfig, mut rng: StdRng, utc_start_ms: i64) -> Self {
        let lap_pace = rng.gen_range(0.95..1.05);
        Self {
            analog: config.analog.clone(),
            imu: config.imu.clone(),
            timers: config.timers.clone(),
            pwm: config.pwm.clone(),
            utc_start_ms,
            now_ms: 0,
            lap_distance_m: 0.0,
            speed_mps: 0.0,
            lap_pace,
            lap_count: 0,
            lap_start_ms: 0,
            last_lap_ms: None,
            sector: -1,
            sector_start_ms: 0,
            last_sector_ms: None,
            accel_long_g: 0.0,
            gsum_max: 0.0,
            rng,
        }
    }

    /// Advance the simulation to `elapsed_ms` since start
    ///
    /// Calls with a time earlier than the last one are ignored.
    pub fn update(&mut self, elapsed_ms: u64) {
        if elapsed_ms <= self.now_ms {
            return;
        }
        let dt = (elapsed_ms - self.now_ms) as f64 / 1000.0;
        self.now_ms = elapsed_ms;

        // Pace varies around the track: slower into the hairpin half
        let lap_fraction = self.lap_distance_m / lap_length_m();
        let target_mps = 38.0 * self.lap_pace * (1.0 - 0.25 * (lap_fraction * std::f64::consts::TAU).cos());
        let jitter: f64 = self.rng.gen_range(-0.3..0.3);
        let new_speed = (self.speed_mps + (target_mps - self.speed_mps) * (dt * 1.5).min(1.0) + jitter).max(0.0);

        self.accel_long_g = if dt > 0.0 {
            (new_speed - self.speed_mps) / dt / 9.81
        } else {
            0.0
        };
        self.speed_mps = new_speed;

        let step = self.speed_mps * dt;
        self.lap_distance_m += step;

        // Sector 0 opens when the car first rolls off the line
        if self.sector < 0 && step > 0.0 {
            self.sector = 0;
        }

        let lap_done = self.lap_distance_m >= lap_length_m();
        if lap_done {
            self.lap_distance_m -= lap_length_m();
            self.lap_count += 1;
            self.last_lap_ms = Some(elapsed_ms - self.lap_start_ms);
            self.lap_start_ms = elapsed_ms;
            self.lap_pace = self.rng.gen_range(0.95..1.05);
        }

        if self.sector >= 0 {
            let sector_length = lap_length_m() / f64::from(SECTORS_PER_LAP);
            let sector_now = if lap_done {
                0
            } else {
                ((self.lap_distance_m / sector_length).floor() as i32).min(SECTORS_PER_LAP - 1)
            };
            if sector_now != self.sector {
                self.last_sector_ms = Some(elapsed_ms - self.sector_start_ms);
                self.sector_start_ms = elapsed_ms;
                self.sector = sector_now;
            }
        }

        self.gsum_max = self.gsum_max.max(self.gsum_g());
    }

    fn lateral_g(&self) -> f64 {
        self.speed_mps * self.speed_mps / TRACK_RADIUS_M / 9.81
    }

    fn gsum_g(&self) -> f64 {
        self.lateral_g().hypot(self.accel_long_g)
    }

    /// Heading angle around the track, radians
    fn track_angle(&self) -> f64 {
        self.lap_distance_m / TRACK_RADIUS_M
    }

    fn seconds(&self) -> f64 {
        self.now_ms as f64 / 1000.0
    }

    /// Voltage at an analog input pin
    fn pin_volts(&self, channel: u8) -> Option<f64> {
        let t = self.seconds();
        match channel {
            // Battery with alternator ripple, behind the sense divider
            7 => Some((13.8 + 0.2 * (t * 0.5).sin()) / f64::from(BATTERY_DIVIDER_SCALE)),
            0..=6 => Some(2.5 + 2.0 * (t * (0.2 + 0.1 * f64::from(channel))).sin()),
            _ => None,
        }
    }

    /// Motion seen by one physical IMU sensor channel, in G or deg/s
    fn imu_physical(&self, channel: u8) -> Option<f64> {
        let t = self.seconds();
        let value = match channel {
            0 => self.lateral_g(),
            1 => self.accel_long_g,
            2 => 1.0 + 0.02 * (t * 11.0).sin(),
            3 => (self.speed_mps / TRACK_RADIUS_M).to_degrees(),
            4 => 0.5 * (t * 3.1).sin(),
            5 => 2.0 * self.lateral_g(),
            _ => return None,
        };
        Some(value)
    }

    /// Engine speed; it follows road speed through a fixed gear
    fn engine_rpm(&self) -> f64 {
        2500.0 + self.speed_mps * 110.0
    }
}

fn lap_length_m() -> f64 {
    std::f64::consts::TAU * TRACK_RADIUS_M
}

fn ms_to_minutes(ms: u64) -> f32 {
    (ms as f64 / 60_000.0) as f32
}

impl Clock for DemoSensors {
    fn uptime_ms(&self) -> Option<i32> {
        i32::try_from(self.now_ms).ok()
    }

    fn utc_millis(&self) -> Option<i64> {
        Some(self.utc_start_ms + self.now_ms as i64)
    }

    fn elapsed_minutes(&self) -> Option<f32> {
        Some(ms_to_minutes(self.now_ms))
    }
}

impl AnalogInputs for DemoSensors {
    fn analog(&self, channel: u8) -> Option<f32> {
        let config = self.analog.get(usize::from(channel))?;
        let counts = (self.pin_volts(channel)? / f64::from(ADC_VOLTAGE_SCALING)).round();
        let raw = counts.clamp(0.0, f64::from(ADC_MAX_COUNTS)) as u16;
        Some(config.scale(raw))
    }
}

impl Imu for DemoSensors {
    fn imu_axis(&self, channel: u8) -> Option<f32> {
        let config = self.imu.get(usize::from(channel))?;
        let physical = self.imu_physical(config.physical_channel)?;
        let raw = (physical * f64::from(config.axis.counts_per_unit())).round() as i32;
        Some(config.scale(raw))
    }

    fn gsum(&self) -> Option<f32> {
        Some(self.gsum_g() as f32)
    }

    fn gsum_max(&self) -> Option<f32> {
        Some(self.gsum_max as f32)
    }

    fn gsum_pct(&self) -> Option<f32> {
        if self.gsum_max <= 0.0 {
            return Some(0.0);
        }
        Some((self.gsum_g() / self.gsum_max * 100.0) as f32)
    }
}

impl Timers for DemoSensors {
    fn timer(&self, channel: u8) -> Option<f32> {
        let config = self.timers.get(usize::from(channel))?;
        // Only the first input is wired, to the crank sensor
        let period_us = match channel {
            0 => {
                let pulses = f64::from(config.pulse_per_revolution.max(1));
                (60_000_000.0 / (self.engine_rpm() * pulses)).round() as u32
            }
            _ => 0,
        };
        Some(config.scale(period_us))
    }
}

impl Gpio for DemoSensors {
    fn gpio(&self, channel: u8) -> Option<i32> {
        match channel {
            // Brake light on while decelerating
            0 => Some(i32::from(self.accel_long_g < -0.1)),
            1 | 2 => Some(0),
            _ => None,
        }
    }
}

impl Pwm for DemoSensors {
    fn pwm(&self, channel: u8) -> Option<i32> {
        self.pwm.get(usize::from(channel)).map(PwmConfig::start_value)
    }
}

impl Gps for DemoSensors {
    fn latitude(&self) -> Option<f32> {
        let north_m = TRACK_RADIUS_M * self.track_angle().sin();
        Some((TRACK_LAT + north_m / METERS_PER_DEG_LAT) as f32)
    }

    fn longitude(&self) -> Option<f32> {
        let east_m = TRACK_RADIUS_M * self.track_angle().cos();
        let meters_per_deg_lon = METERS_PER_DEG_LAT * TRACK_LAT.to_radians().cos();
        Some((TRACK_LON + east_m / meters_per_deg_lon) as f32)
    }

    fn speed_mph(&self) -> Option<f32> {
        Some((self.speed_mps * MPS_TO_MPH) as f32)
    }

    fn altitude_ft(&self) -> Option<f32> {
        Some((320.0 + 15.0 * self.track_angle().sin()) as f32)
    }

    fn satellites(&self) -> Option<i32> {
        Some(11)
    }

    fn quality(&self) -> Option<i32> {
        // Differential fix
        Some(2)
    }

    fn dop(&self) -> Option<f32> {
        Some(0.9)
    }
}

impl LapStats for DemoSensors {
    fn lap_count(&self) -> Option<i32> {
        Some(self.lap_count)
    }

    fn last_lap_minutes(&self) -> Option<f32> {
        Some(self.last_lap_ms.map_or(0.0, ms_to_minutes))
    }

    fn sector(&self) -> Option<i32> {
        Some(self.sector)
    }

    fn last_sector_minutes(&self) -> Option<f32> {
        Some(self.last_sector_ms.map_or(0.0, ms_to_minutes))
    }

    fn predicted_minutes(&self) -> Option<f32> {
        let last = self.last_lap_ms?;
        // Scale the last lap by this lap's progress so far
        let fraction = self.lap_distance_m / lap_length_m();
        if fraction <= 0.0 {
            return Some(ms_to_minutes(last));
        }
        let elapsed = (self.now_ms - self.lap_start_ms) as f64;
        let projected = elapsed / fraction;
        Some(ms_to_minutes(((projected + last as f64) / 2.0) as u64))
    }

    fn current_lap(&self) -> Option<i32> {
        Some(self.lap_count + 1)
    }

    fn distance_miles(&self) -> Option<f32> {
        Some((self.lap_distance_m / METERS_PER_MILE) as f32)
    }

    fn session_minutes(&self) -> Option<f32> {
        Some(ms_to_minutes(self.now_ms))
    }
}
