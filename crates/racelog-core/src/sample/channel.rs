//! A single record entry
//!
//! The value, populated flag and tick stamp are independent atomics. The
//! sampling task is the only writer; readers on other tasks see each field
//! as a whole, never a torn value, but may observe a value from one tick and
//! a stamp from the next.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use super::{SampleDataKind, SampleValue};
use crate::acquire::{Acquisition, SensorHub};
use crate::config::ChannelConfig;

/// One channel in a sample record
#[derive(Debug)]
pub struct ChannelSample<'cfg> {
    /// Index into the owning group's configuration array
    channel_index: u8,
    /// Configuration entry this sample was built from
    config: &'cfg ChannelConfig,
    acquisition: Acquisition,
    /// Refreshed on every tick regardless of the configured rate
    always_sample: bool,
    /// Raw bits of the value, interpreted per `acquisition.kind()`
    value: AtomicU64,
    populated: AtomicBool,
    ticks: AtomicU32,
}

impl<'cfg> ChannelSample<'cfg> {
    pub(crate) fn new(channel_index: u8, config: &'cfg ChannelConfig, acquisition: Acquisition) -> Self {
        Self {
            channel_index,
            config,
            acquisition,
            always_sample: false,
            value: AtomicU64::new(0),
            populated: AtomicBool::new(false),
            ticks: AtomicU32::new(0),
        }
    }

    pub(crate) fn always_sampled(mut self) -> Self {
        self.always_sample = true;
        self
    }

    /// Index passed to indexed acquisitions
    pub fn channel_index(&self) -> u8 {
        self.channel_index
    }

    /// The configuration entry this sample is bound to
    pub fn config(&self) -> &'cfg ChannelConfig {
        self.config
    }

    /// Configured label
    pub fn label(&self) -> &'cfg str {
        &self.config.label
    }

    /// Configured units
    pub fn units(&self) -> &'cfg str {
        &self.config.units
    }

    /// The bound acquisition
    pub fn acquisition(&self) -> Acquisition {
        self.acquisition
    }

    /// Value representation of this entry
    pub fn kind(&self) -> SampleDataKind {
        self.acquisition.kind()
    }

    /// Whether this entry ignores decimation
    pub fn is_always_sampled(&self) -> bool {
        self.always_sample
    }

    /// Whether the entry has been refreshed at least once
    pub fn is_populated(&self) -> bool {
        self.populated.load(Ordering::Acquire)
    }

    /// Tick of the last refresh
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Current value in its native representation
    pub fn value(&self) -> SampleValue {
        let bits = self.value.load(Ordering::Acquire);
        match self.kind() {
            SampleDataKind::Int | SampleDataKind::IntNoArg => SampleValue::Int(bits as u32 as i32),
            SampleDataKind::Float | SampleDataKind::FloatNoArg => {
                SampleValue::Float(f32::from_bits(bits as u32))
            }
            SampleDataKind::LongLongNoArg => SampleValue::LongLong(bits as i64),
        }
    }

    /// Whether two samples share index, configuration entry and acquisition
    pub fn same_binding(&self, other: &ChannelSample<'_>) -> bool {
        self.channel_index == other.channel_index
            && std::ptr::eq(self.config, other.config)
            && self.acquisition == other.acquisition
            && self.always_sample == other.always_sample
    }

    /// Read the bound acquisition and store the result
    ///
    /// Returns `false` and leaves the entry untouched when the acquisition
    /// has no value.
    pub(crate) fn refresh<S: SensorHub + ?Sized>(&self, sensors: &S, tick: u32) -> bool {
        let Some(value) = self.acquisition.read(sensors, self.channel_index) else {
            return false;
        };
        self.store(value);
        self.populated.store(true, Ordering::Release);
        self.ticks.store(tick, Ordering::Release);
        true
    }

    fn store(&self, value: SampleValue) {
        // A mismatched variant would be reinterpreted by `value()`
        debug_assert_eq!(
            std::mem::discriminant(&value),
            std::mem::discriminant(&self.value()),
            "value kind does not match binding"
        );
        let bits = match value {
            SampleValue::Int(v) => u64::from(v as u32),
            SampleValue::Float(v) => u64::from(v.to_bits()),
            SampleValue::LongLong(v) => v as u64,
        };
        self.value.store(bits, Ordering::Release);
    }
}
