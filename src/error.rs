// src/error.rs
use thiserror::Error;

/// Operator input that cannot become a broker endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("broker host cannot be empty")]
    EmptyHost,
    #[error("port must be a number between 1 and 65535, got {0:?}")]
    InvalidPort(String),
}

/// Failure reading or writing the broker settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no home directory available for the settings file")]
    NoHomeDir,
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of the broker dialog's save action.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to save settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Transport-level send failure reported by a publisher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("publisher transport is disconnected")]
    Disconnected,
    #[error("publish to {topic} rejected: {reason}")]
    Rejected { topic: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("channel {index} out of range (panel has {count} channels)")]
    ChannelOutOfRange { index: usize, count: usize },
    #[error("channel {index}: value {value} is not finite")]
    NonFiniteValue { index: usize, value: f64 },
    #[error("MQTT handler not available")]
    PublisherUnavailable,
    #[error("failed to publish calibration data: {0}")]
    Publish(#[from] PublishError),
}
