//! Error types for logger configuration

use thiserror::Error;

use super::TimeType;

/// Errors that can occur while loading or validating a logger configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON, or a value outside its allowed set
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A group has more entries than the hardware has channels
    #[error("Too many {group} channels: {count} configured, hardware supports {max}")]
    TooManyChannels {
        /// Group name
        group: &'static str,
        /// Entries configured
        count: usize,
        /// Hardware channels
        max: usize,
    },

    /// No time channel of a required type
    #[error("Missing required time channel: {0:?}")]
    MissingTimeChannel(TimeType),

    /// An enabled channel has no label
    #[error("Enabled {group} channel {index} has an empty label")]
    EmptyLabel {
        /// Group name
        group: &'static str,
        /// Entry index within the group
        index: usize,
    },

    /// A label is longer than the logger stores
    #[error("Label '{label}' exceeds {max} characters")]
    LabelTooLong {
        /// The offending label
        label: String,
        /// Maximum length
        max: usize,
    },

    /// A units string is longer than the logger stores
    #[error("Units '{units}' exceed {max} characters")]
    UnitsTooLong {
        /// The offending units
        units: String,
        /// Maximum length
        max: usize,
    },

    /// A sample rate that is not one of the supported rates
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u16),

    /// A tick rate that does not divide a second into whole milliseconds
    #[error("Invalid tick rate: {0} Hz")]
    InvalidTickRate(u32),
}
