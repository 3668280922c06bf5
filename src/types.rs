// src/types.rs
use crate::calibration::CalibrationChannel;
use crate::error::CalibrationError;

/// Operator / measurement events sent to the calibration engine.
#[derive(Clone, Debug)]
pub enum PanelCommand {
    StartStream,
    StopStream,
    /// External "new measurement" notification, one value per channel.
    MeasuredValues(Vec<f64>),
    SetActual { channel: usize, value: f64 },
    Calculate,
    Reset,
    SendCalibration,
    RequestTable,
    Close,
}

/// What the engine reports back for display.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelMessage {
    Log(String),
    StreamStatus(bool),
    Table(Vec<ChannelRow>),
    Ratios(Vec<f64>),
    CalibrationSent(String),
    ResetSent,
    Failed {
        action: PanelAction,
        error: CalibrationError,
    },
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    SetActual,
    Reset,
    SendCalibration,
}

/// One row of the calibration table as the operator sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelRow {
    pub label: String,
    pub measured: String,
    pub actual: f64,
    pub ratio: String,
}

impl From<&CalibrationChannel> for ChannelRow {
    fn from(channel: &CalibrationChannel) -> Self {
        Self {
            label: channel.label(),
            measured: channel.measured_text(),
            actual: channel.actual(),
            ratio: channel.ratio_text(),
        }
    }
}
