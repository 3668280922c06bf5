//! Calibration command strings published to the device.

pub const CALIBRATION_TOPIC: &str = "dccalibrated/data";
pub const RESET_COMMAND: &str = "$ResetCalibrationData#";
const CALIBRATED_DATA_PREFIX: &str = "$DC_CalibratedData:";

/// `$DC_CalibratedData:<r1>,<r2>,...#` in channel order.
///
/// Ratios keep a decimal point (`1.0`, not `1`); the device firmware parses
/// the same text the dashboard has always sent.
pub fn calibration_command(ratios: &[f64]) -> String {
    let joined = ratios
        .iter()
        .map(|r| format!("{r:?}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{CALIBRATED_DATA_PREFIX}{joined}#")
}
