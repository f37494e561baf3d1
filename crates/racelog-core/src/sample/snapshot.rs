//! Owned record snapshots
//!
//! Consumers that need to hold on to values past the next tick copy them out
//! of the live record.

use serde::{Deserialize, Serialize};

use super::{SampleRecord, SampleValue};

/// One channel in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotChannel {
    /// Channel label
    pub label: String,
    /// Channel units
    pub units: String,
    /// `None` until the channel has been populated
    pub value: Option<SampleValue>,
    /// Tick of the channel's last refresh
    pub ticks: u32,
}

/// A copy of a sample record at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSnapshot {
    /// Record tick when the snapshot was taken
    pub ticks: u32,
    /// Record tick in milliseconds
    pub timestamp_ms: u64,
    /// Channel values in record order
    pub channels: Vec<SnapshotChannel>,
}

impl SampleSnapshot {
    pub(crate) fn capture(record: &SampleRecord<'_>) -> Self {
        let ticks = record.ticks();
        let channels = record
            .entries()
            .iter()
            .map(|sample| SnapshotChannel {
                label: sample.label().to_string(),
                units: sample.units().to_string(),
                value: sample.is_populated().then(|| sample.value()),
                ticks: sample.ticks(),
            })
            .collect();

        Self {
            ticks,
            timestamp_ms: record.tick_rate().ticks_to_ms(ticks),
            channels,
        }
    }

    /// Channels refreshed on the snapshot's own tick
    pub fn fresh_channels(&self) -> impl Iterator<Item = &SnapshotChannel> {
        self.channels
            .iter()
            .filter(move |channel| channel.value.is_some() && channel.ticks == self.ticks)
    }

    /// Values widened to doubles, `NaN` for channels never populated
    pub fn values(&self) -> Vec<f64> {
        self.channels
            .iter()
            .map(|channel| channel.value.map_or(f64::NAN, |v| v.as_f64()))
            .collect()
    }
}
