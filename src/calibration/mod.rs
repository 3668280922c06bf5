// src/calibration/mod.rs
pub mod channel;
pub mod panel;
pub mod payload;

pub use channel::{
    compute_ratio, CalibrationChannel, RatioDisplay, ACTUAL_RANGE, DISPLAY_LIMIT, NOT_APPLICABLE,
};
pub use panel::{ChannelValues, DcCalibrationPanel, DEFAULT_CHANNEL_COUNT};
pub use payload::{calibration_command, CALIBRATION_TOPIC, RESET_COMMAND};
