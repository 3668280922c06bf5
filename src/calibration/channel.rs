use std::fmt;
use std::ops::RangeInclusive;

/// Measurements closer to zero than this are treated as zero.
pub const ZERO_EPSILON: f64 = 1e-9;
/// Ratios at or beyond this magnitude are shown as [`NOT_APPLICABLE`].
pub const DISPLAY_LIMIT: f64 = 1000.0;
pub const NOT_APPLICABLE: &str = "N/A";
/// Range of the operator's reference entry.
pub const ACTUAL_RANGE: RangeInclusive<f64> = -1000.0..=1000.0;

/// Calibration factor for one channel: `actual / measured`.
///
/// A zero measurement yields `1.0` when the reference is also zero and
/// `+inf` otherwise.
pub fn compute_ratio(measured: f64, actual: f64) -> f64 {
    if measured.abs() > ZERO_EPSILON {
        actual / measured
    } else if actual == 0.0 {
        1.0
    } else {
        f64::INFINITY
    }
}

/// Clamps to [`ACTUAL_RANGE`] and keeps three decimals, like the entry box.
pub fn normalize_actual(value: f64) -> f64 {
    let clamped = value.clamp(*ACTUAL_RANGE.start(), *ACTUAL_RANGE.end());
    (clamped * 1000.0).round() / 1000.0
}

/// What the ratio column currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum RatioDisplay {
    /// Fresh or reset channel, shown as `1.000`.
    #[default]
    Unset,
    Value(f64),
    NotApplicable,
}

impl RatioDisplay {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio.abs() >= DISPLAY_LIMIT {
            RatioDisplay::NotApplicable
        } else {
            RatioDisplay::Value(ratio)
        }
    }

    /// The number sent for this channel: the shown text read back, `N/A` as 1.0.
    pub fn payload_value(&self) -> f64 {
        match self {
            RatioDisplay::Unset | RatioDisplay::NotApplicable => 1.0,
            RatioDisplay::Value(ratio) => format!("{ratio:.6}").parse().unwrap_or(*ratio),
        }
    }
}

impl fmt::Display for RatioDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatioDisplay::Unset => f.write_str("1.000"),
            RatioDisplay::Value(ratio) => write!(f, "{ratio:.6}"),
            RatioDisplay::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CalibrationChannel {
    index: usize,
    pub(crate) measured: f64,
    pub(crate) actual: f64,
    pub(crate) display: RatioDisplay,
}

impl CalibrationChannel {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            measured: 0.0,
            actual: 0.0,
            display: RatioDisplay::Unset,
        }
    }

    /// 1-based channel number.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> String {
        format!("Channel {}", self.index)
    }

    pub fn measured(&self) -> f64 {
        self.measured
    }

    pub fn actual(&self) -> f64 {
        self.actual
    }

    pub fn ratio(&self) -> f64 {
        compute_ratio(self.measured, self.actual)
    }

    pub fn display(&self) -> RatioDisplay {
        self.display
    }

    pub fn measured_text(&self) -> String {
        format!("{:.3}", self.measured)
    }

    pub fn ratio_text(&self) -> String {
        self.display.to_string()
    }

    pub(crate) fn refresh_display(&mut self) -> f64 {
        let ratio = self.ratio();
        self.display = RatioDisplay::from_ratio(ratio);
        ratio
    }

    pub(crate) fn reset(&mut self) {
        self.actual = 0.0;
        self.display = RatioDisplay::Unset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_actual_over_measured() {
        for (m, a) in [(2.0, 1.9), (-4.0, 2.0), (0.5, 0.0), (1e-6, 3.0), (123.456, 120.0)] {
            assert!((compute_ratio(m, a) - a / m).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_measurement_tie_break() {
        assert_eq!(compute_ratio(0.0, 0.0), 1.0);
        assert_eq!(compute_ratio(1e-10, 0.0), 1.0);
        assert_eq!(compute_ratio(0.0, 2.5), f64::INFINITY);
        assert_eq!(compute_ratio(-1e-10, -2.5), f64::INFINITY);
    }

    #[test]
    fn large_ratios_display_not_applicable() {
        assert_eq!(RatioDisplay::from_ratio(1000.0), RatioDisplay::NotApplicable);
        assert_eq!(RatioDisplay::from_ratio(-5000.0), RatioDisplay::NotApplicable);
        assert_eq!(RatioDisplay::from_ratio(f64::INFINITY).to_string(), "N/A");
        assert_eq!(RatioDisplay::from_ratio(999.9999).to_string(), "999.999900");
        assert_eq!(RatioDisplay::from_ratio(0.95).to_string(), "0.950000");
    }

    #[test]
    fn payload_value_reads_display_text() {
        assert_eq!(RatioDisplay::Unset.payload_value(), 1.0);
        assert_eq!(RatioDisplay::NotApplicable.payload_value(), 1.0);
        assert_eq!(RatioDisplay::Value(1.0 / 3.0).payload_value(), 0.333333);
        assert_eq!(RatioDisplay::Value(0.95).payload_value(), 0.95);
    }

    #[test]
    fn actual_is_clamped_and_rounded() {
        assert_eq!(normalize_actual(2.5), 2.5);
        assert_eq!(normalize_actual(1500.0), 1000.0);
        assert_eq!(normalize_actual(-1500.0), -1000.0);
        assert_eq!(normalize_actual(1.23456), 1.235);
    }

    #[test]
    fn fresh_channel_texts() {
        let ch = CalibrationChannel::new(3);
        assert_eq!(ch.label(), "Channel 3");
        assert_eq!(ch.measured_text(), "0.000");
        assert_eq!(ch.ratio_text(), "1.000");
        assert_eq!(ch.ratio(), 1.0);
    }
}
