//! Logger Messages
//!
//! Envelopes passed from the sampling task to storage and telemetry
//! consumers. Only sample messages carry a reference to the live record.

use crate::sample::SampleRecord;

/// What a logger message announces
#[derive(Debug, Clone, Copy)]
pub enum MessageKind<'r, 'cfg> {
    /// Logging session started
    Start,
    /// Logging session stopped
    Stop,
    /// IMU calibration requested
    Calibrate,
    /// Flush queued data
    Enqueue,
    /// New sample data is available in the referenced record
    Sample(&'r SampleRecord<'cfg>),
}

impl MessageKind<'_, '_> {
    /// Short name for log output
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::Start => "start",
            MessageKind::Stop => "stop",
            MessageKind::Calibrate => "calibrate",
            MessageKind::Enqueue => "enqueue",
            MessageKind::Sample(_) => "sample",
        }
    }
}

/// Envelope stamped with the tick it was created on
#[derive(Debug, Clone, Copy)]
pub struct LoggerMessage<'r, 'cfg> {
    /// Message payload
    pub kind: MessageKind<'r, 'cfg>,
    /// Tick at message creation
    pub ticks: u32,
    /// Whether consumers must emit channel metadata before this message's data
    pub needs_meta: bool,
}

impl<'r, 'cfg> LoggerMessage<'r, 'cfg> {
    /// Create a message of any kind
    pub fn new(kind: MessageKind<'r, 'cfg>, ticks: u32, needs_meta: bool) -> Self {
        Self {
            kind,
            ticks,
            needs_meta,
        }
    }

    /// Session start; consumers emit channel metadata first
    pub fn start(ticks: u32) -> Self {
        Self::new(MessageKind::Start, ticks, true)
    }

    /// Session stop
    pub fn stop(ticks: u32) -> Self {
        Self::new(MessageKind::Stop, ticks, false)
    }

    /// IMU calibration request
    pub fn calibrate(ticks: u32) -> Self {
        Self::new(MessageKind::Calibrate, ticks, false)
    }

    /// Flush request
    pub fn enqueue(ticks: u32) -> Self {
        Self::new(MessageKind::Enqueue, ticks, false)
    }

    /// A sample message stamped with the record's current tick
    pub fn sample(record: &'r SampleRecord<'cfg>, needs_meta: bool) -> Self {
        Self::new(MessageKind::Sample(record), record.ticks(), needs_meta)
    }

    /// The referenced record, for sample messages
    pub fn sample_ref(&self) -> Option<&'r SampleRecord<'cfg>> {
        match self.kind {
            MessageKind::Sample(record) => Some(record),
            _ => None,
        }
    }

    /// See [`is_sample_data_valid`]
    pub fn is_valid(&self) -> bool {
        is_sample_data_valid(self)
    }
}

/// Check that the data a message refers to is still the data it was created for
///
/// Messages without a sample reference are always valid. A sample message is
/// valid only while the record's tick equals the message tick exactly. The
/// record is refreshed in place without locking, so any difference, even a
/// single tick, means the producer has moved on and the message must be
/// dropped. Do not widen this to a tolerance window.
pub fn is_sample_data_valid(message: &LoggerMessage<'_, '_>) -> bool {
    match message.sample_ref() {
        None => true,
        Some(record) => record.ticks() == message.ticks,
    }
}
