//! Drives a sample record from the demo sensors the way the sampling task does

use racelog_core::config::{LoggerConfig, SampleRate};
use racelog_core::demo::DemoSensors;
use racelog_core::message::LoggerMessage;
use racelog_core::sample::{Cycle, SampleRecord, SampleValue};

#[test]
fn test_demo_session() {
    let config = LoggerConfig::default();
    let record = SampleRecord::build(&config).unwrap();
    let mut sensors = DemoSensors::seeded(&config, 42, 1_700_000_000_000);
    let tick_rate = record.tick_rate();

    let mut sampled_cycles = 0;
    for tick in 0..5000 {
        sensors.update(tick_rate.ticks_to_ms(tick));
        if record.populate(&sensors, tick).is_sampled() {
            sampled_cycles += 1;
        }
    }

    // 25 Hz IMU every 40 ticks, 10 Hz GPS and lap channels every 100
    let expected = (0..5000).filter(|tick| tick % 40 == 0 || tick % 100 == 0).count();
    assert_eq!(sampled_cycles, expected);
    assert_eq!(record.ticks(), 4999);

    assert_eq!(record.value_of("Interval"), Some(SampleValue::Int(4999)));
    assert_eq!(
        record.value_of("Utc"),
        Some(SampleValue::LongLong(1_700_000_000_000 + 4999))
    );

    let battery = record.lookup("Battery").unwrap();
    assert!((13.5..14.1).contains(&battery.value));
    assert_eq!(battery.units, "Volts");

    let speed = record.lookup("Speed").unwrap();
    assert!(speed.value > 0.0);

    assert_eq!(record.value_of("GPSSats"), Some(SampleValue::Int(11)));
    // No predicted time before the first completed lap
    assert!(!record.get("PredTime").unwrap().is_populated());
    assert!(record
        .entries()
        .iter()
        .filter(|sample| sample.label() != "PredTime")
        .all(|sample| sample.is_populated()));
}

#[test]
fn test_slow_channels_on_demo_session() {
    let mut config = LoggerConfig::default();
    for imu in &mut config.imu {
        imu.cfg.sample_rate = SampleRate::Disabled;
    }
    config.imu_gsum.sample_rate = SampleRate::Hz1;
    config.imu_gsum_max.sample_rate = SampleRate::Hz1;
    config.imu_gsum_pct.sample_rate = SampleRate::Hz1;

    let record = SampleRecord::build(&config).unwrap();
    let mut sensors = DemoSensors::seeded(&config, 5, 0);

    let mut outcomes = Vec::new();
    for tick in [0, 100, 150, 200] {
        sensors.update(u64::from(tick));
        outcomes.push(record.populate(&sensors, tick));
    }

    assert_eq!(
        outcomes,
        vec![
            Cycle::Sampled(SampleRate::Hz10),
            Cycle::Sampled(SampleRate::Hz10),
            Cycle::Skipped,
            Cycle::Sampled(SampleRate::Hz10),
        ]
    );

    let message = LoggerMessage::sample(&record, false);
    assert_eq!(message.ticks, 200);
    assert!(message.is_valid());
}
