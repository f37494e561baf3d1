//! Logger Configuration
//!
//! Per-group channel configuration consumed by the sample record builder.
//! Each group is an array of entries carrying a [`ChannelConfig`] plus the
//! group-specific fields the acquisition side needs:
//! - Time (uptime and UTC)
//! - Analog inputs
//! - IMU axes and the derived g-sum channels
//! - Timers, GPIO and PWM
//! - GPS fix fields
//! - Lap and session statistics

mod error;
mod types;

pub use error::ConfigError;
pub use types::*;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of analog inputs on the hardware
pub const CONFIG_ADC_CHANNELS: usize = 8;
/// Number of IMU axes on the hardware
pub const CONFIG_IMU_CHANNELS: usize = 6;
/// Number of timer inputs on the hardware
pub const CONFIG_TIMER_CHANNELS: usize = 3;
/// Number of GPIO pins on the hardware
pub const CONFIG_GPIO_CHANNELS: usize = 3;
/// Number of PWM outputs on the hardware
pub const CONFIG_PWM_CHANNELS: usize = 4;

/// Volts per ADC count for a 10-bit converter on a 5V reference
pub const ADC_VOLTAGE_SCALING: f32 = 0.0048828125;

/// Highest raw ADC reading
pub const ADC_MAX_COUNTS: u16 = 1023;

/// Divider ratio on the battery sense input
pub const BATTERY_DIVIDER_SCALE: f32 = 4.0;

/// Time channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Settings shared by every channel
    pub cfg: ChannelConfig,
    /// Which clock the channel reports
    pub time_type: TimeType,
}

/// Analog input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogConfig {
    /// Settings shared by every channel
    pub cfg: ChannelConfig,
    /// Conversion from pin voltage
    pub scaling: ScalingMode,
}

impl AnalogConfig {
    /// Convert raw ADC counts to the configured engineering value
    pub fn scale(&self, raw: u16) -> f32 {
        let volts = f32::from(raw) * ADC_VOLTAGE_SCALING;
        match self.scaling {
            ScalingMode::Raw => volts,
            ScalingMode::Linear { scale, offset } => volts * scale + offset,
        }
    }
}

/// IMU axis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuConfig {
    /// Settings shared by every channel
    pub cfg: ChannelConfig,
    /// Axis reported by the channel
    pub axis: ImuAxis,
    /// Physical sensor channel mapped to this axis
    pub physical_channel: u8,
    /// Raw reading at zero
    pub zero_value: i32,
}

impl ImuConfig {
    /// Convert a raw reading to G or degrees per second
    pub fn scale(&self, raw: i32) -> f32 {
        (raw - self.zero_value) as f32 / self.axis.counts_per_unit()
    }
}

/// Timer input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Settings shared by every channel
    pub cfg: ChannelConfig,
    /// What the timer reports
    pub mode: TimerMode,
    /// Pulses per crank revolution, for RPM mode
    pub pulse_per_revolution: u8,
}

impl TimerConfig {
    /// Convert a measured pulse period in microseconds to the configured unit
    ///
    /// A zero period means no pulses were seen and reads as 0.
    pub fn scale(&self, period_us: u32) -> f32 {
        if period_us == 0 {
            return 0.0;
        }
        let period = f64::from(period_us);
        let pulses = f64::from(self.pulse_per_revolution.max(1));
        let value = match self.mode {
            TimerMode::Rpm => 60_000_000.0 / (period * pulses),
            TimerMode::Frequency => 1_000_000.0 / period,
            TimerMode::PeriodMs => period / 1000.0,
            TimerMode::PeriodUsec => period,
        };
        value as f32
    }
}

/// GPIO configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpioConfig {
    /// Settings shared by every channel
    pub cfg: ChannelConfig,
    /// Pin direction
    pub mode: GpioMode,
}

/// PWM output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PwmConfig {
    /// Settings shared by every channel
    pub cfg: ChannelConfig,
    /// Which quantity the output varies
    pub output_mode: PwmOutputMode,
    /// Period in timer units
    pub period: u16,
    /// Startup duty cycle in percent
    pub start_duty_cycle: u8,
}

impl PwmConfig {
    /// Value the output reports before anything drives it
    ///
    /// Duty mode reports the duty cycle in percent, frequency mode the period.
    pub fn start_value(&self) -> i32 {
        match self.output_mode {
            PwmOutputMode::Duty => i32::from(self.start_duty_cycle.min(100)),
            PwmOutputMode::Frequency => i32::from(self.period),
        }
    }
}

/// GPS channel configuration, one entry per fix field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsConfig {
    /// Latitude
    pub latitude: ChannelConfig,
    /// Longitude
    pub longitude: ChannelConfig,
    /// Ground speed
    pub speed: ChannelConfig,
    /// Altitude
    pub altitude: ChannelConfig,
    /// Satellites in use
    pub satellites: ChannelConfig,
    /// Fix quality
    pub quality: ChannelConfig,
    /// Dilution of precision
    pub dop: ChannelConfig,
}

impl GpsConfig {
    /// Entries in record order
    pub fn channels(&self) -> [&ChannelConfig; 7] {
        [
            &self.latitude,
            &self.longitude,
            &self.speed,
            &self.altitude,
            &self.satellites,
            &self.quality,
            &self.dop,
        ]
    }
}

/// Lap and session statistics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapConfig {
    /// Elapsed time; always part of the record
    pub elapsed_time: ChannelConfig,
    /// Completed laps
    pub lap_count: ChannelConfig,
    /// Last lap time
    pub lap_time: ChannelConfig,
    /// Current sector
    pub sector: ChannelConfig,
    /// Last sector time
    pub sector_time: ChannelConfig,
    /// Predicted lap time
    pub predicted_time: ChannelConfig,
    /// Lap in progress
    pub current_lap: ChannelConfig,
    /// Lap distance
    pub distance: ChannelConfig,
    /// Session time
    pub session_time: ChannelConfig,
}

impl LapConfig {
    /// Optional entries in record order (elapsed time excluded)
    pub fn channels(&self) -> [&ChannelConfig; 8] {
        [
            &self.lap_count,
            &self.lap_time,
            &self.sector,
            &self.sector_time,
            &self.predicted_time,
            &self.current_lap,
            &self.distance,
            &self.session_time,
        ]
    }
}

/// Complete logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Scheduler tick rate the sample rates are decimated against
    #[serde(default)]
    pub tick_rate: TickRate,
    /// Time channels; one of each type is required
    pub time: Vec<TimeConfig>,
    /// Analog inputs
    pub analog: Vec<AnalogConfig>,
    /// IMU axes
    pub imu: Vec<ImuConfig>,
    /// Combined acceleration
    pub imu_gsum: ChannelConfig,
    /// Peak combined acceleration
    pub imu_gsum_max: ChannelConfig,
    /// Combined acceleration as a share of the peak
    pub imu_gsum_pct: ChannelConfig,
    /// Timer inputs
    pub timers: Vec<TimerConfig>,
    /// Digital pins
    pub gpio: Vec<GpioConfig>,
    /// PWM outputs
    pub pwm: Vec<PwmConfig>,
    /// GPS fix fields
    pub gps: GpsConfig,
    /// Lap and session statistics
    pub lap: LapConfig,
}

impl LoggerConfig {
    /// Load and validate a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The first time channel of the given type
    pub fn time_channel(&self, time_type: TimeType) -> Option<&TimeConfig> {
        self.time.iter().find(|t| t.time_type == time_type)
    }

    /// Check the structural validity of the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_group_size("analog", self.analog.len(), CONFIG_ADC_CHANNELS)?;
        check_group_size("imu", self.imu.len(), CONFIG_IMU_CHANNELS)?;
        check_group_size("timer", self.timers.len(), CONFIG_TIMER_CHANNELS)?;
        check_group_size("gpio", self.gpio.len(), CONFIG_GPIO_CHANNELS)?;
        check_group_size("pwm", self.pwm.len(), CONFIG_PWM_CHANNELS)?;

        for time_type in [TimeType::Uptime, TimeType::UtcMillis] {
            if self.time_channel(time_type).is_none() {
                return Err(ConfigError::MissingTimeChannel(time_type));
            }
        }

        for (group, index, cfg) in self.all_channels() {
            check_channel(group, index, cfg)?;
        }

        Ok(())
    }

    /// Every channel entry tagged with its group name and index in the group
    fn all_channels(&self) -> Vec<(&'static str, usize, &ChannelConfig)> {
        let mut channels = Vec::new();
        channels.extend(self.time.iter().enumerate().map(|(i, t)| ("time", i, &t.cfg)));
        channels.extend(self.analog.iter().enumerate().map(|(i, a)| ("analog", i, &a.cfg)));
        channels.extend(self.imu.iter().enumerate().map(|(i, a)| ("imu", i, &a.cfg)));
        channels.push(("imu", CONFIG_IMU_CHANNELS, &self.imu_gsum));
        channels.push(("imu", CONFIG_IMU_CHANNELS + 1, &self.imu_gsum_max));
        channels.push(("imu", CONFIG_IMU_CHANNELS + 2, &self.imu_gsum_pct));
        channels.extend(self.timers.iter().enumerate().map(|(i, t)| ("timer", i, &t.cfg)));
        channels.extend(self.gpio.iter().enumerate().map(|(i, g)| ("gpio", i, &g.cfg)));
        channels.extend(self.pwm.iter().enumerate().map(|(i, p)| ("pwm", i, &p.cfg)));
        channels.extend(self.gps.channels().into_iter().enumerate().map(|(i, c)| ("gps", i, c)));
        channels.push(("lap", 0, &self.lap.elapsed_time));
        channels.extend(
            self.lap
                .channels()
                .into_iter()
                .enumerate()
                .map(|(i, c)| ("lap", i + 1, c)),
        );
        channels
    }
}

fn check_group_size(group: &'static str, count: usize, max: usize) -> Result<(), ConfigError> {
    if count > max {
        return Err(ConfigError::TooManyChannels { group, count, max });
    }
    Ok(())
}

fn check_channel(group: &'static str, index: usize, cfg: &ChannelConfig) -> Result<(), ConfigError> {
    if cfg.is_enabled() && cfg.label.is_empty() {
        return Err(ConfigError::EmptyLabel { group, index });
    }
    if cfg.label.chars().count() > DEFAULT_LABEL_LENGTH {
        return Err(ConfigError::LabelTooLong {
            label: cfg.label.clone(),
            max: DEFAULT_LABEL_LENGTH,
        });
    }
    if cfg.units.chars().count() > DEFAULT_UNITS_LENGTH {
        return Err(ConfigError::UnitsTooLong {
            units: cfg.units.clone(),
            max: DEFAULT_UNITS_LENGTH,
        });
    }
    Ok(())
}

/// Number of entries a sample record built from this configuration will hold
///
/// Counts the six structural entries (interval, UTC, elapsed time and the
/// three g-sum channels) plus every enabled configurable channel.
pub fn enabled_channel_count(config: &LoggerConfig) -> usize {
    fn enabled<'a>(channels: impl IntoIterator<Item = &'a ChannelConfig>) -> usize {
        channels.into_iter().filter(|c| c.is_enabled()).count()
    }

    STRUCTURAL_CHANNELS
        + enabled(config.analog.iter().map(|a| &a.cfg))
        + enabled(config.imu.iter().map(|a| &a.cfg))
        + enabled(config.timers.iter().map(|t| &t.cfg))
        + enabled(config.gpio.iter().map(|g| &g.cfg))
        + enabled(config.pwm.iter().map(|p| &p.cfg))
        + enabled(config.gps.channels())
        + enabled(config.lap.channels())
}

/// Entries present in every sample record regardless of configuration
pub const STRUCTURAL_CHANNELS: usize = 6;

impl Default for LoggerConfig {
    /// Factory defaults: battery voltage, all IMU axes, GPS and lap statistics
    fn default() -> Self {
        let analog = (0..CONFIG_ADC_CHANNELS)
            .map(|i| {
                if i == CONFIG_ADC_CHANNELS - 1 {
                    AnalogConfig {
                        cfg: ChannelConfig::new("Battery", "Volts", SampleRate::Hz1).with_display(2, 0.0, 20.0),
                        scaling: ScalingMode::Linear {
                            scale: BATTERY_DIVIDER_SCALE,
                            offset: 0.0,
                        },
                    }
                } else {
                    AnalogConfig {
                        cfg: ChannelConfig::new(format!("Analog{}", i + 1), "Volts", SampleRate::Disabled)
                            .with_display(2, 0.0, 5.0),
                        scaling: ScalingMode::Raw,
                    }
                }
            })
            .collect();

        let imu_axes = [
            ("AccelX", "G", ImuAxis::X),
            ("AccelY", "G", ImuAxis::Y),
            ("AccelZ", "G", ImuAxis::Z),
            ("Yaw", "Deg/Sec", ImuAxis::Yaw),
            ("Pitch", "Deg/Sec", ImuAxis::Pitch),
            ("Roll", "Deg/Sec", ImuAxis::Roll),
        ];
        let imu = imu_axes
            .into_iter()
            .enumerate()
            .map(|(i, (label, units, axis))| {
                let (min, max) = if units == "G" { (-3.0, 3.0) } else { (-120.0, 120.0) };
                ImuConfig {
                    cfg: ChannelConfig::new(label, units, SampleRate::Hz25).with_display(2, min, max),
                    axis,
                    physical_channel: i as u8,
                    zero_value: 0,
                }
            })
            .collect();

        let timers = (0..CONFIG_TIMER_CHANNELS)
            .map(|i| TimerConfig {
                cfg: ChannelConfig::new(
                    if i == 0 { "RPM".to_string() } else { format!("Timer{}", i + 1) },
                    "rpm",
                    SampleRate::Disabled,
                )
                .with_display(0, 0.0, 10000.0),
                mode: TimerMode::Rpm,
                pulse_per_revolution: 1,
            })
            .collect();

        let gpio = (0..CONFIG_GPIO_CHANNELS)
            .map(|i| GpioConfig {
                cfg: ChannelConfig::new(format!("GPIO{}", i + 1), "", SampleRate::Disabled)
                    .with_display(0, 0.0, 1.0),
                mode: GpioMode::Input,
            })
            .collect();

        let pwm = (0..CONFIG_PWM_CHANNELS)
            .map(|i| PwmConfig {
                cfg: ChannelConfig::new(format!("PWM{}", i + 1), "", SampleRate::Disabled)
                    .with_display(0, 0.0, 100.0),
                output_mode: PwmOutputMode::Duty,
                period: 100,
                start_duty_cycle: 50,
            })
            .collect();

        Self {
            tick_rate: TickRate::default(),
            time: vec![
                TimeConfig {
                    cfg: ChannelConfig::new("Interval", "ms", SampleRate::Hz1),
                    time_type: TimeType::Uptime,
                },
                TimeConfig {
                    cfg: ChannelConfig::new("Utc", "ms", SampleRate::Hz1),
                    time_type: TimeType::UtcMillis,
                },
            ],
            analog,
            imu,
            imu_gsum: ChannelConfig::new("Gsum", "G", SampleRate::Hz25).with_display(2, 0.0, 3.0),
            imu_gsum_max: ChannelConfig::new("GsumMax", "G", SampleRate::Hz25).with_display(2, 0.0, 3.0),
            imu_gsum_pct: ChannelConfig::new("GsumPct", "%", SampleRate::Hz25).with_display(0, 0.0, 100.0),
            timers,
            gpio,
            pwm,
            gps: GpsConfig {
                latitude: ChannelConfig::new("Latitude", "Degrees", SampleRate::Hz10)
                    .with_display(6, -180.0, 180.0),
                longitude: ChannelConfig::new("Longitude", "Degrees", SampleRate::Hz10)
                    .with_display(6, -180.0, 180.0),
                speed: ChannelConfig::new("Speed", "mph", SampleRate::Hz10).with_display(2, 0.0, 150.0),
                altitude: ChannelConfig::new("Altitude", "ft", SampleRate::Hz10).with_display(0, 0.0, 4000.0),
                satellites: ChannelConfig::new("GPSSats", "", SampleRate::Hz10).with_display(0, 0.0, 20.0),
                quality: ChannelConfig::new("GPSQual", "", SampleRate::Hz10).with_display(0, 0.0, 5.0),
                dop: ChannelConfig::new("GPSDOP", "", SampleRate::Hz10).with_display(1, 0.0, 20.0),
            },
            lap: LapConfig {
                elapsed_time: ChannelConfig::new("ElapsedTime", "Min", SampleRate::Hz10)
                    .with_display(4, 0.0, 0.0),
                lap_count: ChannelConfig::new("LapCount", "", SampleRate::Hz10),
                lap_time: ChannelConfig::new("LapTime", "Min", SampleRate::Hz10).with_display(4, 0.0, 0.0),
                sector: ChannelConfig::new("Sector", "", SampleRate::Hz10),
                sector_time: ChannelConfig::new("SectorTime", "Min", SampleRate::Hz10)
                    .with_display(4, 0.0, 0.0),
                predicted_time: ChannelConfig::new("PredTime", "Min", SampleRate::Hz5)
                    .with_display(4, 0.0, 0.0),
                current_lap: ChannelConfig::new("CurrentLap", "", SampleRate::Hz10),
                distance: ChannelConfig::new("Distance", "mi", SampleRate::Hz10).with_display(3, 0.0, 0.0),
                session_time: ChannelConfig::new("SessionTime", "Min", SampleRate::Hz10)
                    .with_display(4, 0.0, 0.0),
            },
        }
    }
}
