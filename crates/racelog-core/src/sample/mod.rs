//! Sample Records
//!
//! A [`SampleRecord`] is the uniform, ordered set of channel values the
//! sampling task refreshes every tick. Entries are polymorphic over their
//! value representation ([`SampleDataKind`]) and are bound to the
//! configuration entry they were built from.

mod channel;
mod record;
mod snapshot;

pub use channel::ChannelSample;
pub use record::{ChannelReading, Cycle, SampleRecord};
pub use snapshot::{SampleSnapshot, SnapshotChannel};

use serde::{Deserialize, Serialize};

/// Value representation and calling convention of a record entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleDataKind {
    /// Integer read taking a channel index
    Int,
    /// Integer read bound to one quantity
    IntNoArg,
    /// Float read taking a channel index
    Float,
    /// Float read bound to one quantity
    FloatNoArg,
    /// 64-bit integer read bound to one quantity
    LongLongNoArg,
}

impl SampleDataKind {
    /// Whether the acquisition takes a channel index
    pub fn is_indexed(self) -> bool {
        matches!(self, SampleDataKind::Int | SampleDataKind::Float)
    }
}

/// A typed channel value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    /// 32-bit integer
    Int(i32),
    /// Single precision float
    Float(f32),
    /// 64-bit integer
    LongLong(i64),
}

impl SampleValue {
    /// Widen to a double regardless of the native representation
    pub fn as_f64(&self) -> f64 {
        match *self {
            SampleValue::Int(v) => f64::from(v),
            SampleValue::Float(v) => f64::from(v),
            SampleValue::LongLong(v) => v as f64,
        }
    }

    /// The integer value, if this is one
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            SampleValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// The float value, if this is one
    pub fn as_float(&self) -> Option<f32> {
        match *self {
            SampleValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The 64-bit value, if this is one
    pub fn as_long_long(&self) -> Option<i64> {
        match *self {
            SampleValue::LongLong(v) => Some(v),
            _ => None,
        }
    }
}
