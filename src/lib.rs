//! DC calibration and MQTT broker settings for the Sarayu dashboard.
//!
//! - [`broker`]: broker host/port validation and the per-user settings file.
//! - [`calibration`]: per-channel calibration ratios and the command strings
//!   published on `dccalibrated/data`.
//! - [`engine`]: runs a calibration panel on its own thread, driven by
//!   [`types::PanelCommand`]s.

pub mod broker;
pub mod calibration;
pub mod engine;
pub mod error;
pub mod publisher;
pub mod source;
pub mod types;

pub use broker::{BrokerAddressConfig, BrokerEndpoint, SettingsStore};
pub use calibration::{DcCalibrationPanel, DEFAULT_CHANNEL_COUNT};
pub use error::{BrokerError, CalibrationError, PublishError, SettingsError, ValidationError};
pub use publisher::{ChannelPublisher, Publication, Publisher};
pub use source::{ManualSource, MeasurementSource, SimulatedSource};
