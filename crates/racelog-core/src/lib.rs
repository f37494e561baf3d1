//! # racelog Core Library
//!
//! Sample record engine for the racelog motorsport data logger.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Channel configuration (analog, IMU, timer, GPIO, PWM, GPS, lap statistics)
//! - Sample record building from configuration
//! - Per-tick record population with per-channel decimation
//! - Lock-free staleness checks for messages referencing the live record
//! - Channel lookup by label
//! - Logging status tracking with observer notification
//!
//! ## Example
//!
//! ```rust,ignore
//! use racelog_core::prelude::*;
//!
//! let config = LoggerConfig::load(Path::new("logger.json"))?;
//! let record = SampleRecord::build(&config)?;
//!
//! // Sampling task, once per tick
//! record.populate(&sensors, tick);
//!
//! // Any consumer
//! if let Some(reading) = record.lookup("Battery") {
//!     println!("{} {}", reading.value, reading.units);
//! }
//! ```

pub mod acquire;
pub mod config;
pub mod demo;
pub mod logging;
pub mod message;
pub mod sample;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::acquire::{Acquisition, SensorHub};
    pub use crate::config::{enabled_channel_count, ChannelConfig, ConfigError, LoggerConfig, SampleRate, TickRate};
    pub use crate::demo::DemoSensors;
    pub use crate::logging::{LoggingState, LoggingStatus, LoggingStatusEvent};
    pub use crate::message::{is_sample_data_valid, LoggerMessage, MessageKind};
    pub use crate::sample::{ChannelReading, ChannelSample, Cycle, SampleDataKind, SampleRecord, SampleSnapshot, SampleValue};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
