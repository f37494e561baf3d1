use pretty_assertions::assert_eq;
use racelog_core::acquire::{
    Acquisition, AnalogInputs, Clock, FloatSource, Gpio, Gps, Imu, IndexedFloatSource, IndexedIntSource,
    IntSource, LapStats, LongSource, Pwm, Timers,
};
use racelog_core::config::{
    enabled_channel_count, ConfigError, LoggerConfig, SampleRate, ScalingMode, TickRate,
};
use racelog_core::message::{is_sample_data_valid, LoggerMessage};
use racelog_core::sample::{Cycle, SampleDataKind, SampleRecord, SampleValue};
use std::io;
use std::sync::{Arc, Mutex};

/// Latched sensor state for tests
struct MockSensors {
    tick_rate: TickRate,
    /// Scheduler ticks since boot
    uptime_ticks: u32,
    analog: [f32; 8],
    imu: [f32; 6],
    gpio: [i32; 3],
    pwm: [i32; 4],
    timers: [f32; 3],
    gps_fix: bool,
}

impl MockSensors {
    fn new(tick_rate: TickRate) -> Self {
        Self {
            tick_rate,
            uptime_ticks: 0,
            analog: [0.0; 8],
            imu: [0.1, -0.2, 1.0, 3.5, -1.5, 0.25],
            gpio: [0; 3],
            pwm: [0; 4],
            timers: [0.0; 3],
            gps_fix: true,
        }
    }

    /// Latch a raw ADC reading, scaled the way the analog driver would
    fn set_analog_raw(&mut self, config: &LoggerConfig, channel: usize, raw: u16) {
        self.analog[channel] = config.analog[channel].scale(raw);
    }

    fn uptime(&self) -> u64 {
        self.tick_rate.ticks_to_ms(self.uptime_ticks)
    }
}

impl Clock for MockSensors {
    fn uptime_ms(&self) -> Option<i32> {
        Some(self.uptime() as i32)
    }

    fn utc_millis(&self) -> Option<i64> {
        // No time fix
        Some(0)
    }

    fn elapsed_minutes(&self) -> Option<f32> {
        Some((self.uptime() as f64 / 60000.0) as f32)
    }
}

impl AnalogInputs for MockSensors {
    fn analog(&self, channel: u8) -> Option<f32> {
        self.analog.get(channel as usize).copied()
    }
}

impl Imu for MockSensors {
    fn imu_axis(&self, channel: u8) -> Option<f32> {
        self.imu.get(channel as usize).copied()
    }

    fn gsum(&self) -> Option<f32> {
        Some(1.0)
    }

    fn gsum_max(&self) -> Option<f32> {
        Some(1.0)
    }

    fn gsum_pct(&self) -> Option<f32> {
        Some(100.0)
    }
}

impl Timers for MockSensors {
    fn timer(&self, channel: u8) -> Option<f32> {
        self.timers.get(channel as usize).copied()
    }
}

impl Gpio for MockSensors {
    fn gpio(&self, channel: u8) -> Option<i32> {
        self.gpio.get(channel as usize).copied()
    }
}

impl Pwm for MockSensors {
    fn pwm(&self, channel: u8) -> Option<i32> {
        self.pwm.get(channel as usize).copied()
    }
}

impl Gps for MockSensors {
    fn latitude(&self) -> Option<f32> {
        self.gps_fix.then_some(0.0)
    }

    fn longitude(&self) -> Option<f32> {
        self.gps_fix.then_some(0.0)
    }

    fn speed_mph(&self) -> Option<f32> {
        self.gps_fix.then_some(0.0)
    }

    fn altitude_ft(&self) -> Option<f32> {
        self.gps_fix.then_some(0.0)
    }

    fn satellites(&self) -> Option<i32> {
        self.gps_fix.then_some(0)
    }

    fn quality(&self) -> Option<i32> {
        self.gps_fix.then_some(0)
    }

    fn dop(&self) -> Option<f32> {
        self.gps_fix.then_some(0.0)
    }
}

impl LapStats for MockSensors {
    fn lap_count(&self) -> Option<i32> {
        Some(0)
    }

    fn last_lap_minutes(&self) -> Option<f32> {
        Some(0.0)
    }

    fn sector(&self) -> Option<i32> {
        Some(-1)
    }

    fn last_sector_minutes(&self) -> Option<f32> {
        Some(0.0)
    }

    fn predicted_minutes(&self) -> Option<f32> {
        Some(0.0)
    }

    fn current_lap(&self) -> Option<i32> {
        Some(0)
    }

    fn distance_miles(&self) -> Option<f32> {
        Some(0.0)
    }

    fn session_minutes(&self) -> Option<f32> {
        Some(0.0)
    }
}

/// Factory config on a 5 ms scheduler tick
fn test_config() -> LoggerConfig {
    LoggerConfig {
        tick_rate: TickRate::new(200).unwrap(),
        ..LoggerConfig::default()
    }
}

#[test]
fn test_init_sample_record() {
    let config = test_config();
    let record = SampleRecord::build(&config).unwrap();

    assert_eq!(enabled_channel_count(&config), 28);
    assert_eq!(record.len(), 28);

    let mut samples = record.entries().iter();

    let interval = samples.next().unwrap();
    assert_eq!(interval.label(), "Interval");
    assert_eq!(interval.units(), "ms");
    assert!(std::ptr::eq(interval.config(), &config.time[0].cfg));
    assert_eq!(interval.acquisition(), Acquisition::IntNoArg(IntSource::Uptime));

    let utc = samples.next().unwrap();
    assert_eq!(utc.label(), "Utc");
    assert!(std::ptr::eq(utc.config(), &config.time[1].cfg));
    assert_eq!(utc.kind(), SampleDataKind::LongLongNoArg);

    let elapsed = samples.next().unwrap();
    assert!(std::ptr::eq(elapsed.config(), &config.lap.elapsed_time));
    assert_eq!(elapsed.acquisition(), Acquisition::FloatNoArg(FloatSource::ElapsedTime));

    for (i, analog) in config.analog.iter().enumerate() {
        if analog.cfg.sample_rate == SampleRate::Disabled {
            continue;
        }
        let sample = samples.next().unwrap();
        assert_eq!(sample.channel_index() as usize, i);
        assert!(std::ptr::eq(sample.config(), &analog.cfg));
        assert_eq!(sample.acquisition(), Acquisition::Float(IndexedFloatSource::Analog));
    }

    for (i, imu) in config.imu.iter().enumerate() {
        if imu.cfg.sample_rate == SampleRate::Disabled {
            continue;
        }
        let sample = samples.next().unwrap();
        assert_eq!(sample.channel_index() as usize, i);
        assert!(std::ptr::eq(sample.config(), &imu.cfg));
        assert_eq!(sample.acquisition(), Acquisition::Float(IndexedFloatSource::Imu));
    }

    for (cfg, source) in [
        (&config.imu_gsum, FloatSource::ImuGsum),
        (&config.imu_gsum_max, FloatSource::ImuGsumMax),
        (&config.imu_gsum_pct, FloatSource::ImuGsumPct),
    ] {
        let sample = samples.next().unwrap();
        assert!(std::ptr::eq(sample.config(), cfg));
        assert_eq!(sample.acquisition(), Acquisition::FloatNoArg(source));
    }

    // Timer, GPIO and PWM are disabled in the factory config; GPS is next
    let gps = &config.gps;
    for (cfg, acquisition) in [
        (&gps.latitude, Acquisition::FloatNoArg(FloatSource::GpsLatitude)),
        (&gps.longitude, Acquisition::FloatNoArg(FloatSource::GpsLongitude)),
        (&gps.speed, Acquisition::FloatNoArg(FloatSource::GpsSpeed)),
        (&gps.altitude, Acquisition::FloatNoArg(FloatSource::GpsAltitude)),
        (&gps.satellites, Acquisition::IntNoArg(IntSource::GpsSatellites)),
        (&gps.quality, Acquisition::IntNoArg(IntSource::GpsQuality)),
        (&gps.dop, Acquisition::FloatNoArg(FloatSource::GpsDop)),
    ] {
        let sample = samples.next().unwrap();
        assert!(std::ptr::eq(sample.config(), cfg), "expected {}", cfg.label);
        assert_eq!(sample.acquisition(), acquisition);
    }

    let lap = &config.lap;
    for (cfg, acquisition) in [
        (&lap.lap_count, Acquisition::IntNoArg(IntSource::LapCount)),
        (&lap.lap_time, Acquisition::FloatNoArg(FloatSource::LastLapTime)),
        (&lap.sector, Acquisition::IntNoArg(IntSource::Sector)),
        (&lap.sector_time, Acquisition::FloatNoArg(FloatSource::LastSectorTime)),
        (&lap.predicted_time, Acquisition::FloatNoArg(FloatSource::PredictedTime)),
        (&lap.current_lap, Acquisition::IntNoArg(IntSource::CurrentLap)),
        (&lap.distance, Acquisition::FloatNoArg(FloatSource::Distance)),
        (&lap.session_time, Acquisition::FloatNoArg(FloatSource::SessionTime)),
    ] {
        let sample = samples.next().unwrap();
        assert!(std::ptr::eq(sample.config(), cfg), "expected {}", cfg.label);
        assert_eq!(sample.acquisition(), acquisition);
    }

    assert!(samples.next().is_none());
}

#[test]
fn test_record_order_with_optional_groups() {
    let mut config = test_config();
    config.timers[1].cfg.sample_rate = SampleRate::Hz50;
    config.gpio[0].cfg.sample_rate = SampleRate::Hz10;
    config.pwm[3].cfg.sample_rate = SampleRate::Hz5;
    // Disabling every IMU axis must not drop the g-sum channels
    for imu in &mut config.imu {
        imu.cfg.sample_rate = SampleRate::Disabled;
    }
    config.gps.altitude.sample_rate = SampleRate::Disabled;
    config.lap.session_time.sample_rate = SampleRate::Disabled;

    let record = SampleRecord::build(&config).unwrap();
    let labels: Vec<&str> = record.entries().iter().map(|s| s.label()).collect();

    assert_eq!(
        labels,
        vec![
            "Interval", "Utc", "ElapsedTime", "Battery", "Gsum", "GsumMax", "GsumPct", "Timer2", "GPIO1",
            "PWM4", "Latitude", "Longitude", "Speed", "GPSSats", "GPSQual", "GPSDOP", "LapCount", "LapTime",
            "Sector", "SectorTime", "PredTime", "CurrentLap", "Distance",
        ]
    );
    assert_eq!(record.len(), enabled_channel_count(&config));

    let timer = record.get("Timer2").unwrap();
    assert_eq!(timer.channel_index(), 1);
    assert_eq!(timer.kind(), SampleDataKind::Float);

    let gpio = record.get("GPIO1").unwrap();
    assert_eq!(gpio.acquisition(), Acquisition::Int(IndexedIntSource::Gpio));

    let pwm = record.get("PWM4").unwrap();
    assert_eq!(pwm.channel_index(), 3);
    assert_eq!(pwm.acquisition(), Acquisition::Int(IndexedIntSource::Pwm));
}

#[test]
fn test_minimal_record_has_structural_channels() {
    let mut config = test_config();
    for analog in &mut config.analog {
        analog.cfg.sample_rate = SampleRate::Disabled;
    }
    for imu in &mut config.imu {
        imu.cfg.sample_rate = SampleRate::Disabled;
    }
    for cfg in [
        &mut config.gps.latitude,
        &mut config.gps.longitude,
        &mut config.gps.speed,
        &mut config.gps.altitude,
        &mut config.gps.satellites,
        &mut config.gps.quality,
        &mut config.gps.dop,
        &mut config.lap.lap_count,
        &mut config.lap.lap_time,
        &mut config.lap.sector,
        &mut config.lap.sector_time,
        &mut config.lap.predicted_time,
        &mut config.lap.current_lap,
        &mut config.lap.distance,
        &mut config.lap.session_time,
    ] {
        cfg.sample_rate = SampleRate::Disabled;
    }

    let record = SampleRecord::build(&config).unwrap();
    let labels: Vec<&str> = record.entries().iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["Interval", "Utc", "ElapsedTime", "Gsum", "GsumMax", "GsumPct"]);
}

#[test]
fn test_populate_sample_record() {
    let mut config = test_config();
    config.analog[7].scaling = ScalingMode::Raw;

    let mut sensors = MockSensors::new(config.tick_rate);
    sensors.set_analog_raw(&config, 7, 123);
    sensors.uptime_ticks = 1;

    let record = SampleRecord::build(&config).unwrap();
    record.populate(&sensors, 0);

    let values: Vec<SampleValue> = record.entries().iter().map(|s| s.value()).collect();
    let mut values = values.into_iter();

    // Interval: one 5 ms tick
    assert_eq!(values.next(), Some(SampleValue::Int(5)));
    // UTC: no time fix
    assert_eq!(values.next(), Some(SampleValue::LongLong(0)));
    // Elapsed time in minutes
    assert_eq!(values.next(), Some(SampleValue::Float((5.0 / 60000.0) as f32)));
    // Battery
    assert_eq!(values.next(), Some(SampleValue::Float(123.0 * 0.0048828125)));
    for axis in sensors.imu {
        assert_eq!(values.next(), Some(SampleValue::Float(axis)));
    }
    // G-sum, g-sum max, g-sum percentage
    assert_eq!(values.next(), Some(SampleValue::Float(1.0)));
    assert_eq!(values.next(), Some(SampleValue::Float(1.0)));
    assert_eq!(values.next(), Some(SampleValue::Float(100.0)));
    // Latitude, longitude, speed, altitude
    for _ in 0..4 {
        assert_eq!(values.next(), Some(SampleValue::Float(0.0)));
    }
    // Satellites, quality
    assert_eq!(values.next(), Some(SampleValue::Int(0)));
    assert_eq!(values.next(), Some(SampleValue::Int(0)));
    // DOP
    assert_eq!(values.next(), Some(SampleValue::Float(0.0)));
    // Lap count, lap time
    assert_eq!(values.next(), Some(SampleValue::Int(0)));
    assert_eq!(values.next(), Some(SampleValue::Float(0.0)));
    // Sector before the first boundary
    assert_eq!(values.next(), Some(SampleValue::Int(-1)));
    // Sector time, predicted time
    assert_eq!(values.next(), Some(SampleValue::Float(0.0)));
    assert_eq!(values.next(), Some(SampleValue::Float(0.0)));
    // Current lap
    assert_eq!(values.next(), Some(SampleValue::Int(0)));
    // Distance, session time
    assert_eq!(values.next(), Some(SampleValue::Float(0.0)));
    assert_eq!(values.next(), Some(SampleValue::Float(0.0)));
    assert_eq!(values.next(), None);

    assert_eq!(record.ticks(), 0);
    assert!(record.entries().iter().all(|s| s.is_populated()));
}

#[test]
fn test_logger_message_always_has_time() {
    let config = test_config();
    let sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();

    let mut sampled = 0;
    let mut tick = 0;
    while sampled < 5 && tick <= 1000 {
        let cycle = record.populate(&sensors, tick);
        tick += 1;

        // Time channels are refreshed whether or not anything else was due
        for sample in &record.entries()[..3] {
            assert!(sample.is_populated());
            assert_eq!(sample.ticks(), tick - 1);
        }

        if cycle.is_sampled() {
            sampled += 1;
        }
    }

    assert!(tick < 1000);
}

#[test]
fn test_time_channels_ignore_rate() {
    let mut config = test_config();
    for time in &mut config.time {
        time.cfg.sample_rate = SampleRate::Disabled;
    }
    config.lap.elapsed_time.sample_rate = SampleRate::Disabled;

    let sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();
    assert_eq!(record.len(), 28);

    record.populate(&sensors, 3);
    for label in ["Interval", "Utc", "ElapsedTime"] {
        let sample = record.get(label).unwrap();
        assert!(sample.is_populated(), "{} not populated", label);
        assert_eq!(sample.ticks(), 3);
    }
}

#[test]
fn test_decimation_boundary() {
    let mut config = test_config();
    // 10 Hz on a 200 Hz scheduler: every 20 ticks
    config.analog[7].cfg.sample_rate = SampleRate::Hz10;
    let interval = SampleRate::Hz10.interval_ticks(config.tick_rate).unwrap();
    assert_eq!(interval, 20);

    let mut sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();

    let mut refreshes = Vec::new();
    let mut last_value = record.get("Battery").unwrap().value();
    for tick in 0..interval {
        sensors.analog[7] = tick as f32 + 1.0;
        record.populate(&sensors, tick);
        let value = record.get("Battery").unwrap().value();
        if value != last_value {
            refreshes.push(tick);
        }
        last_value = value;
    }

    // Exactly once per interval, on the boundary tick
    assert_eq!(refreshes, vec![0]);
    let battery = record.get("Battery").unwrap();
    assert_eq!(battery.ticks(), 0);
    assert_eq!(battery.value(), SampleValue::Float(1.0));

    sensors.analog[7] = 99.0;
    record.populate(&sensors, interval);
    let battery = record.get("Battery").unwrap();
    assert_eq!(battery.ticks(), interval);
    assert_eq!(battery.value(), SampleValue::Float(99.0));

    // Between boundaries the previous value is kept
    sensors.analog[7] = -1.0;
    record.populate(&sensors, interval + 1);
    let battery = record.get("Battery").unwrap();
    assert_eq!(battery.ticks(), interval);
    assert_eq!(battery.value(), SampleValue::Float(99.0));
}

#[test]
fn test_cycle_outcomes() {
    let config = test_config();
    let sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();

    // Tick 0 is a boundary for every rate; the IMU runs at 25 Hz
    assert_eq!(record.populate(&sensors, 0), Cycle::Sampled(SampleRate::Hz25));
    // 1 Hz battery only on multiples of 200
    assert_eq!(record.populate(&sensors, 1), Cycle::Skipped);
    // 10 Hz GPS on multiples of 20
    assert_eq!(record.populate(&sensors, 20), Cycle::Sampled(SampleRate::Hz10));
    assert_eq!(record.populate(&sensors, 40), Cycle::Sampled(SampleRate::Hz25));
}

#[test]
fn test_fully_disabled_cycle() {
    let mut config = test_config();
    for analog in &mut config.analog {
        analog.cfg.sample_rate = SampleRate::Disabled;
    }
    for imu in &mut config.imu {
        imu.cfg.sample_rate = SampleRate::Disabled;
    }
    for cfg in [&mut config.imu_gsum, &mut config.imu_gsum_max, &mut config.imu_gsum_pct] {
        cfg.sample_rate = SampleRate::Disabled;
    }
    let gps = &mut config.gps;
    for cfg in [
        &mut gps.latitude,
        &mut gps.longitude,
        &mut gps.speed,
        &mut gps.altitude,
        &mut gps.satellites,
        &mut gps.quality,
        &mut gps.dop,
    ] {
        cfg.sample_rate = SampleRate::Disabled;
    }
    let lap = &mut config.lap;
    for cfg in [
        &mut lap.lap_count,
        &mut lap.lap_time,
        &mut lap.sector,
        &mut lap.sector_time,
        &mut lap.predicted_time,
        &mut lap.current_lap,
        &mut lap.distance,
        &mut lap.session_time,
    ] {
        cfg.sample_rate = SampleRate::Disabled;
    }

    let sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();
    assert_eq!(record.len(), 6);

    assert_eq!(record.populate(&sensors, 0), Cycle::Disabled);
    assert_eq!(record.populate(&sensors, 1), Cycle::Disabled);

    // Time is still there; a disabled g-sum is present but never refreshed
    assert!(record.get("Interval").unwrap().is_populated());
    assert!(!record.get("Gsum").unwrap().is_populated());
}

#[test]
fn test_failed_acquisition_keeps_previous_value() {
    let config = test_config();
    let mut sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();

    sensors.gps_fix = false;
    record.populate(&sensors, 0);

    let speed = record.get("Speed").unwrap();
    assert!(!speed.is_populated());
    // The rest of the pass still ran
    assert!(record.get("Battery").unwrap().is_populated());
    assert!(record.get("LapCount").unwrap().is_populated());
    assert_eq!(record.ticks(), 0);

    sensors.gps_fix = true;
    record.populate(&sensors, 20);
    let speed = record.get("Speed").unwrap();
    assert!(speed.is_populated());
    assert_eq!(speed.ticks(), 20);

    sensors.gps_fix = false;
    record.populate(&sensors, 40);
    let speed = record.get("Speed").unwrap();
    assert!(speed.is_populated());
    assert_eq!(speed.ticks(), 20);
    assert_eq!(record.ticks(), 40);
}

/// Log sink shared between a test and its subscriber
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_failed_acquisition_is_traced() {
    let config = test_config();
    let mut sensors = MockSensors::new(config.tick_rate);
    sensors.gps_fix = false;

    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let record = SampleRecord::build(&config).unwrap();
        record.populate(&sensors, 0);
    });

    let output = log.contents();
    assert!(output.contains("built sample record"), "{output}");
    assert!(output.contains("no value acquired"), "{output}");
    assert!(output.contains("Speed"), "{output}");
    // Channels that did read are not reported
    assert!(!output.contains("Battery"), "{output}");
}

#[test]
fn test_is_valid_logger_message() {
    let config = test_config();
    let sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();
    record.populate(&sensors, 42);

    // Messages without sample data are always valid
    let mut message = LoggerMessage::start(0);
    message.ticks = 42;
    assert!(is_sample_data_valid(&message));
    message.ticks = 41;
    assert!(is_sample_data_valid(&message));
    assert!(LoggerMessage::stop(7).is_valid());

    let mut message = LoggerMessage::sample(&record, false);
    assert_eq!(message.ticks, 42);
    assert!(is_sample_data_valid(&message));
    message.ticks = 41;
    assert!(!is_sample_data_valid(&message));
}

#[test]
fn test_sample_message_goes_stale() {
    let config = test_config();
    let sensors = MockSensors::new(config.tick_rate);
    let record = SampleRecord::build(&config).unwrap();

    record.populate(&sensors, 100);
    let message = LoggerMessage::sample(&record, true);
    assert!(message.is_valid());

    // One tick later the referenced data has been overwritten
    record.populate(&sensors, 101);
    assert!(!message.is_valid());
}

#[test]
fn test_get_sample_value_by_name() {
    let mut config = test_config();
    config.analog[7].scaling = ScalingMode::Raw;

    let mut sensors = MockSensors::new(config.tick_rate);
    sensors.set_analog_raw(&config, 7, 123);
    sensors.uptime_ticks = 1;

    let record = SampleRecord::build(&config).unwrap();
    record.populate(&sensors, 0);

    let speed = record.lookup("Speed").unwrap();
    assert_eq!(speed.value, 0.0);
    assert_eq!(speed.units, "mph");

    let battery = record.lookup("Battery").unwrap();
    assert_eq!(battery.value, f64::from(123.0f32 * 0.0048828125));
    assert_eq!(battery.units, "Volts");

    let sector = record.lookup("Sector").unwrap();
    assert_eq!(sector.value, -1.0);

    assert!(record.lookup("FooBar").is_none());
    assert!(record.lookup("battery").is_none());
}

#[test]
fn test_lookup_first_match_wins() {
    let mut config = test_config();
    config.gpio[0].cfg.sample_rate = SampleRate::Hz10;
    config.gpio[0].cfg.label = "Battery".to_string();

    let mut sensors = MockSensors::new(config.tick_rate);
    sensors.analog[7] = 12.5;
    sensors.gpio[0] = 1;

    let record = SampleRecord::build(&config).unwrap();
    record.populate(&sensors, 0);

    // The analog group precedes GPIO
    let reading = record.lookup("Battery").unwrap();
    assert_eq!(reading.value, 12.5);
    assert_eq!(reading.units, "Volts");
}

#[test]
fn test_rebuild_idempotence() {
    let config = test_config();
    let first = SampleRecord::build(&config).unwrap();
    let second = SampleRecord::build(&config).unwrap();

    assert!(first.same_layout(&second));
    for (a, b) in first.entries().iter().zip(second.entries()) {
        assert_eq!(a.label(), b.label());
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.acquisition(), b.acquisition());
        assert_eq!(a.channel_index(), b.channel_index());
    }

    let mut changed = config.clone();
    changed.gpio[2].cfg.sample_rate = SampleRate::Hz1;
    let third = SampleRecord::build(&changed).unwrap();
    assert!(!first.same_layout(&third));
}

#[test]
fn test_build_rejects_invalid_config() {
    let mut config = test_config();
    config.time.clear();
    assert!(matches!(
        SampleRecord::build(&config),
        Err(ConfigError::MissingTimeChannel(_))
    ));

    let mut config = test_config();
    let extra = config.imu[0].clone();
    config.imu.push(extra);
    assert!(matches!(
        SampleRecord::build(&config),
        Err(ConfigError::TooManyChannels { group: "imu", .. })
    ));
}

#[test]
fn test_snapshot() {
    let config = test_config();
    let mut sensors = MockSensors::new(config.tick_rate);
    sensors.gps_fix = false;
    let record = SampleRecord::build(&config).unwrap();

    record.populate(&sensors, 0);
    record.populate(&sensors, 1);
    let snapshot = record.snapshot();

    assert_eq!(snapshot.ticks, 1);
    assert_eq!(snapshot.timestamp_ms, 5);
    assert_eq!(snapshot.channels.len(), record.len());
    assert_eq!(snapshot.channels[0].label, "Interval");

    let speed = snapshot.channels.iter().find(|c| c.label == "Speed").unwrap();
    assert_eq!(speed.value, None);

    // Only the time channels were refreshed on tick 1
    let fresh: Vec<&str> = snapshot.fresh_channels().map(|c| c.label.as_str()).collect();
    assert_eq!(fresh, vec!["Interval", "Utc", "ElapsedTime"]);

    let values = snapshot.values();
    assert_eq!(values.len(), record.len());
    assert!(values[record.entries().iter().position(|s| s.label() == "Speed").unwrap()].is_nan());

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"Battery\""));
}

#[test]
fn test_concurrent_readers() {
    let config = test_config();
    let mut sensors = MockSensors::new(config.tick_rate);
    sensors.analog[7] = 13.8;
    let record = SampleRecord::build(&config).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for tick in 0..2000 {
                record.populate(&sensors, tick);
            }
        });

        scope.spawn(|| {
            for _ in 0..2000 {
                let message = LoggerMessage::sample(&record, false);
                // The battery value never changes, so any read is whole
                if let Some(reading) = record.lookup("Battery") {
                    assert!(reading.value == 0.0 || reading.value == f64::from(13.8f32));
                }
                // The record tick only moves forward
                assert!(message.ticks <= record.ticks());
            }
        });
    });

    assert_eq!(record.ticks(), 1999);
}

#[test]
fn test_kinds_by_channel() {
    let config = test_config();
    let record = SampleRecord::build(&config).unwrap();

    let kind = |label: &str| record.get(label).unwrap().kind();
    assert_eq!(kind("Interval"), SampleDataKind::IntNoArg);
    assert_eq!(kind("Utc"), SampleDataKind::LongLongNoArg);
    assert_eq!(kind("Battery"), SampleDataKind::Float);
    assert_eq!(kind("GPSSats"), SampleDataKind::IntNoArg);
    assert_eq!(kind("Distance"), SampleDataKind::FloatNoArg);
    assert_eq!(
        record.get("Utc").unwrap().acquisition(),
        Acquisition::LongLongNoArg(LongSource::UtcMillis)
    );
}
