use std::collections::BTreeMap;

use super::channel::{normalize_actual, CalibrationChannel, ZERO_EPSILON};
use super::payload::{calibration_command, CALIBRATION_TOPIC, RESET_COMMAND};
use crate::error::CalibrationError;
use crate::publisher::Publisher;

pub const DEFAULT_CHANNEL_COUNT: usize = 4;

/// Snapshot of one channel's inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelValues {
    pub measured: f64,
    pub actual: f64,
}

/// DC calibration state for a fixed set of channels.
///
/// Channel indices are 1-based everywhere in the public API. Values live only
/// as long as the panel; nothing is persisted.
pub struct DcCalibrationPanel<P: Publisher> {
    channels: Vec<CalibrationChannel>,
    publisher: Option<P>,
}

impl<P: Publisher> DcCalibrationPanel<P> {
    pub fn new(channel_count: usize, publisher: Option<P>) -> Self {
        let channels = (1..=channel_count).map(CalibrationChannel::new).collect();
        Self {
            channels,
            publisher,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[CalibrationChannel] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Result<&CalibrationChannel, CalibrationError> {
        let count = self.channels.len();
        index
            .checked_sub(1)
            .and_then(|i| self.channels.get(i))
            .ok_or(CalibrationError::ChannelOutOfRange { index, count })
    }

    fn channel_mut(&mut self, index: usize) -> Result<&mut CalibrationChannel, CalibrationError> {
        let count = self.channels.len();
        index
            .checked_sub(1)
            .and_then(|i| self.channels.get_mut(i))
            .ok_or(CalibrationError::ChannelOutOfRange { index, count })
    }

    pub fn has_publisher(&self) -> bool {
        self.publisher.is_some()
    }

    pub fn set_measured(&mut self, index: usize, value: f64) -> Result<(), CalibrationError> {
        if !value.is_finite() {
            return Err(CalibrationError::NonFiniteValue { index, value });
        }
        self.channel_mut(index)?.measured = value;
        Ok(())
    }

    /// Operator entry of the reference value. Returns what was stored.
    pub fn set_actual(&mut self, index: usize, value: f64) -> Result<f64, CalibrationError> {
        if !value.is_finite() {
            return Err(CalibrationError::NonFiniteValue { index, value });
        }
        let channel = self.channel_mut(index)?;
        channel.actual = normalize_actual(value);
        Ok(channel.actual)
    }

    /// Applies a reading per channel in order; extra values are ignored.
    ///
    /// A channel whose reference is still zero takes the reading as its
    /// reference. Returns how many channels were updated.
    pub fn set_measured_batch(&mut self, values: &[f64]) -> usize {
        let mut updated = 0;
        for (position, &value) in values.iter().take(self.channels.len()).enumerate() {
            let index = position + 1;
            if let Err(e) = self.set_measured(index, value) {
                log::warn!("Error updating DC value for channel {index}: {e}");
                continue;
            }
            let channel = &mut self.channels[position];
            if channel.actual.abs() < ZERO_EPSILON {
                channel.actual = normalize_actual(value);
            }
            log::trace!("channel {index}: ratio {}", channel.ratio());
            updated += 1;
        }
        updated
    }

    pub fn compute_ratio(&self, index: usize) -> Result<f64, CalibrationError> {
        self.channel(index).map(CalibrationChannel::ratio)
    }

    /// Recomputes one channel and updates its displayed ratio.
    pub fn refresh_display(&mut self, index: usize) -> Result<f64, CalibrationError> {
        Ok(self.channel_mut(index)?.refresh_display())
    }

    /// The "Calculate" action: refreshes every displayed ratio.
    pub fn calculate(&mut self) -> Vec<f64> {
        self.channels
            .iter_mut()
            .map(CalibrationChannel::refresh_display)
            .collect()
    }

    pub fn ratio_text(&self, index: usize) -> Result<String, CalibrationError> {
        self.channel(index).map(CalibrationChannel::ratio_text)
    }

    pub fn measured_text(&self, index: usize) -> Result<String, CalibrationError> {
        self.channel(index).map(CalibrationChannel::measured_text)
    }

    pub fn values(&self) -> BTreeMap<usize, ChannelValues> {
        self.channels
            .iter()
            .map(|c| {
                (
                    c.index(),
                    ChannelValues {
                        measured: c.measured,
                        actual: c.actual,
                    },
                )
            })
            .collect()
    }

    /// Zeroes every reference, then tells the device to drop its calibration.
    ///
    /// The local reset stands even if the reset command cannot be sent.
    pub fn reset_all(&mut self) -> Result<(), CalibrationError> {
        for channel in &mut self.channels {
            channel.reset();
        }
        match self.publish(RESET_COMMAND) {
            Ok(()) => {
                log::info!("calibration reset command sent");
                Ok(())
            }
            Err(e) => {
                log::error!("Error sending reset command: {e}");
                Err(e)
            }
        }
    }

    /// Publishes the displayed ratios. Returns the payload that was sent.
    pub fn send_calibration(&mut self) -> Result<String, CalibrationError> {
        if self.publisher.is_none() {
            return Err(CalibrationError::PublisherUnavailable);
        }
        let ratios: Vec<f64> = self
            .channels
            .iter()
            .map(|c| c.display.payload_value())
            .collect();
        let payload = calibration_command(&ratios);
        if let Err(e) = self.publish(&payload) {
            log::error!("Error sending calibration data: {e}");
            return Err(e);
        }
        log::info!("calibration ratios sent: {payload}");
        Ok(payload)
    }

    fn publish(&mut self, payload: &str) -> Result<(), CalibrationError> {
        let publisher = self
            .publisher
            .as_mut()
            .ok_or(CalibrationError::PublisherUnavailable)?;
        publisher.publish(CALIBRATION_TOPIC, payload)?;
        Ok(())
    }
}
