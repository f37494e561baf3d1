//! racelog bench simulator
//!
//! Runs the sampling task against demo sensors on a tokio interval and feeds
//! sample messages to a logging consumer through a bounded queue, the way the
//! logger firmware wires its tasks together.
//!
//! Usage: `racelog-sim [CONFIG.json] [--seconds N] [--seed N] [--lag-ms N]`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use racelog_core::prelude::*;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Messages the consumer may fall behind by before the sampler drops them
const QUEUE_DEPTH: usize = 10;

/// Command line options
#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    seconds: u32,
    seed: Option<u64>,
    /// Artificial consumer latency, to exercise the staleness check
    lag_ms: u64,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args {
            config: None,
            seconds: 10,
            seed: None,
            lag_ms: 0,
        };

        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--seconds" => args.seconds = next_value(&mut iter, "--seconds")?,
                "--seed" => args.seed = Some(next_value(&mut iter, "--seed")?),
                "--lag-ms" => args.lag_ms = next_value(&mut iter, "--lag-ms")?,
                flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
                path => {
                    if args.config.is_some() {
                        bail!("more than one config file given");
                    }
                    args.config = Some(PathBuf::from(path));
                }
            }
        }

        Ok(args)
    }
}

fn next_value<T>(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = iter.next().with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .with_context(|| format!("invalid value for {flag}: {value}"))
}

/// Counters reported by the sampling task
#[derive(Debug, Default)]
struct SamplerStats {
    ticks: u32,
    sampled: u32,
    dropped: u32,
}

/// Counters reported by the logging consumer
#[derive(Debug, Default)]
struct ConsumerStats {
    samples: u32,
    stale: u32,
    last: Option<SampleSnapshot>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse()?;

    let config = match &args.config {
        Some(path) => LoggerConfig::load(path)
            .with_context(|| format!("loading logger config from {}", path.display()))?,
        None => LoggerConfig::default(),
    };

    let record = SampleRecord::build(&config).context("building sample record")?;
    info!(
        channels = record.len(),
        tick_rate = config.tick_rate.hz(),
        seconds = args.seconds,
        "starting simulation"
    );

    let sensors = match args.seed {
        Some(seed) => DemoSensors::seeded(&config, seed, Utc::now().timestamp_millis()),
        None => DemoSensors::new(&config),
    };

    let status = LoggingStatus::new();
    let observer = status.subscribe();
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);

    let total_ticks = args.seconds.saturating_mul(config.tick_rate.hz());
    let (sampler, consumer) = tokio::join!(
        sample_task(&record, &status, sensors, tx, total_ticks),
        log_task(rx, observer, args.lag_ms),
    );

    info!(
        ticks = sampler.ticks,
        sampled = sampler.sampled,
        dropped = sampler.dropped,
        logged = consumer.samples,
        stale = consumer.stale,
        "simulation finished"
    );

    for label in ["Battery", "Speed", "LapCount", "Gsum"] {
        match record.lookup(label) {
            Some(reading) => info!("{label}: {:.3} {}", reading.value, reading.units),
            None => debug!("{label} not in record"),
        }
    }

    if let Some(snapshot) = consumer.last {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    Ok(())
}

/// The sampling task: populate once per tick and announce sampled cycles
async fn sample_task<'r, 'cfg>(
    record: &'r SampleRecord<'cfg>,
    status: &LoggingStatus,
    mut sensors: DemoSensors,
    tx: mpsc::Sender<LoggerMessage<'r, 'cfg>>,
    total_ticks: u32,
) -> SamplerStats {
    let tick_rate = record.tick_rate();
    let mut ticker = tokio::time::interval(Duration::from_millis(u64::from(tick_rate.ms_per_tick())));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stats = SamplerStats::default();
    let mut needs_meta = true;

    status.set_logging_start(uptime_ms(tick_rate, 1));
    status.set_status(LoggingState::Active);
    send(&tx, LoggerMessage::start(0), &mut stats);

    for tick in 0..total_ticks {
        ticker.tick().await;
        sensors.update(tick_rate.ticks_to_ms(tick));

        if record.populate(&sensors, tick).is_sampled() {
            stats.sampled += 1;
            send(&tx, LoggerMessage::sample(record, needs_meta), &mut stats);
            needs_meta = false;
        }
        stats.ticks += 1;
    }

    info!(
        active_ms = status.active_time(uptime_ms(tick_rate, total_ticks)),
        "logging stopped"
    );
    send(&tx, LoggerMessage::stop(total_ticks), &mut stats);
    status.set_status(LoggingState::Idle);
    status.set_logging_start(0);

    stats
}

/// Uptime after `ticks` scheduler ticks, saturating at the clock's range
fn uptime_ms(tick_rate: TickRate, ticks: u32) -> i32 {
    i32::try_from(tick_rate.ticks_to_ms(ticks)).unwrap_or(i32::MAX)
}

/// Queue a message without blocking the sampling task
fn send<'r, 'cfg>(tx: &mpsc::Sender<LoggerMessage<'r, 'cfg>>, message: LoggerMessage<'r, 'cfg>, stats: &mut SamplerStats) {
    if let Err(err) = tx.try_send(message) {
        stats.dropped += 1;
        debug!(kind = message.kind.name(), "message dropped: {err}");
    }
}

/// The logging consumer: take snapshots of every message that is still current
async fn log_task(
    mut rx: mpsc::Receiver<LoggerMessage<'_, '_>>,
    mut observer: broadcast::Receiver<LoggingStatusEvent>,
    lag_ms: u64,
) -> ConsumerStats {
    let mut stats = ConsumerStats::default();

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else { break };

                if lag_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(lag_ms)).await;
                }

                if !message.is_valid() {
                    stats.stale += 1;
                    debug!(ticks = message.ticks, "stale sample discarded");
                    continue;
                }

                match message.kind {
                    MessageKind::Sample(record) => {
                        let snapshot = record.snapshot();
                        if message.needs_meta {
                            let labels: Vec<&str> = record.entries().iter().map(|s| s.label()).collect();
                            info!(?labels, "channel header");
                        }
                        stats.samples += 1;
                        stats.last = Some(snapshot);
                    }
                    kind => info!(kind = kind.name(), ticks = message.ticks, "logger message"),
                }
            }
            event = observer.recv() => match event {
                Ok(event) => info!(?event.previous, ?event.status, "logging status"),
                Err(broadcast::error::RecvError::Lagged(missed)) => warn!(missed, "status events missed"),
                Err(broadcast::error::RecvError::Closed) => {}
            },
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_saturates() {
        let rate = TickRate::default();
        assert_eq!(uptime_ms(rate, 1), 1);
        assert_eq!(uptime_ms(rate, 90_000), 90_000);

        // Four weeks at 1 kHz is past what an i32 millisecond clock holds
        let ticks = 28 * 24 * 3600 * 1000;
        assert_eq!(uptime_ms(rate, ticks), i32::MAX);

        let slow = TickRate::new(200).unwrap();
        assert_eq!(uptime_ms(slow, u32::MAX), i32::MAX);
    }
}
