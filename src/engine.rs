// src/engine.rs
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::calibration::DcCalibrationPanel;
use crate::publisher::Publisher;
use crate::source::MeasurementSource;
use crate::types::*;

const MAX_COMMANDS_PER_TICK: usize = 10;
const STREAM_POLL: Duration = Duration::from_millis(50);
const IDLE_SLEEP: Duration = Duration::from_millis(20);

/// Runs `panel` on its own thread. The panel is only ever touched there;
/// everything else talks to it through `rx_cmd` and `tx`.
pub fn spawn_thread<P, S>(
    tx: Sender<PanelMessage>,
    rx_cmd: Receiver<PanelCommand>,
    panel: DcCalibrationPanel<P>,
    source: S,
) -> JoinHandle<()>
where
    P: Publisher + Send + 'static,
    S: MeasurementSource + Send + 'static,
{
    thread::spawn(move || {
        let mut engine = Engine {
            tx,
            panel,
            source,
            is_streaming: false,
        };
        engine.run(rx_cmd);
    })
}

struct Engine<P: Publisher, S: MeasurementSource> {
    tx: Sender<PanelMessage>,
    panel: DcCalibrationPanel<P>,
    source: S,
    is_streaming: bool,
}

impl<P: Publisher, S: MeasurementSource> Engine<P, S> {
    fn run(&mut self, rx_cmd: Receiver<PanelCommand>) {
        self.send(PanelMessage::Log(format!(
            "DC calibration ready ({} channels)",
            self.panel.channel_count()
        )));
        if !self.panel.has_publisher() {
            self.send(PanelMessage::Log("MQTT handler not available".to_owned()));
        }

        loop {
            for _ in 0..MAX_COMMANDS_PER_TICK {
                match rx_cmd.try_recv() {
                    Ok(PanelCommand::Close) => return self.close(),
                    Ok(cmd) => self.handle(cmd),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return self.close(),
                }
            }

            if self.is_streaming {
                if let Some(values) = self.source.next_values() {
                    self.apply_measurements(&values);
                }
                thread::sleep(STREAM_POLL);
            } else {
                thread::sleep(IDLE_SLEEP);
            }
        }
    }

    fn handle(&mut self, cmd: PanelCommand) {
        match cmd {
            PanelCommand::StartStream => {
                if !self.is_streaming {
                    self.is_streaming = true;
                    self.send(PanelMessage::StreamStatus(true));
                }
            }
            PanelCommand::StopStream => {
                if self.is_streaming {
                    self.is_streaming = false;
                    self.send(PanelMessage::StreamStatus(false));
                }
            }
            PanelCommand::MeasuredValues(values) => self.apply_measurements(&values),
            PanelCommand::SetActual { channel, value } => {
                match self.panel.set_actual(channel, value) {
                    Ok(_) => self.send_table(),
                    Err(error) => self.fail(PanelAction::SetActual, error),
                }
            }
            PanelCommand::Calculate => {
                let ratios = self.panel.calculate();
                self.send(PanelMessage::Ratios(ratios));
                self.send_table();
            }
            PanelCommand::Reset => {
                let result = self.panel.reset_all();
                self.send_table();
                match result {
                    Ok(()) => self.send(PanelMessage::ResetSent),
                    Err(error) => self.fail(PanelAction::Reset, error),
                }
            }
            PanelCommand::SendCalibration => match self.panel.send_calibration() {
                Ok(payload) => self.send(PanelMessage::CalibrationSent(payload)),
                Err(error) => self.fail(PanelAction::SendCalibration, error),
            },
            PanelCommand::RequestTable => self.send_table(),
            PanelCommand::Close => {}
        }
    }

    fn apply_measurements(&mut self, values: &[f64]) {
        if values.is_empty() {
            return;
        }
        if self.panel.set_measured_batch(values) > 0 {
            self.send_table();
        }
    }

    fn send_table(&self) {
        let rows = self.panel.channels().iter().map(ChannelRow::from).collect();
        self.send(PanelMessage::Table(rows));
    }

    fn fail(&self, action: PanelAction, error: crate::error::CalibrationError) {
        log::warn!("{action:?} failed: {error}");
        self.send(PanelMessage::Failed { action, error });
    }

    fn close(&mut self) {
        self.is_streaming = false;
        log::info!("calibration panel closed");
        self.send(PanelMessage::Closed);
    }

    // The GUI side may already be gone; nothing to do about it here.
    fn send(&self, msg: PanelMessage) {
        self.tx.send(msg).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalibrationError;
    use crate::publisher::ChannelPublisher;
    use crate::source::ManualSource;
    use std::sync::mpsc::channel;

    const WAIT: Duration = Duration::from_secs(5);

    fn collect_until_closed(rx: &Receiver<PanelMessage>) -> Vec<PanelMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.recv_timeout(WAIT) {
            let done = msg == PanelMessage::Closed;
            out.push(msg);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn commands_drive_panel_and_publisher() {
        let (publisher, rx_pub) = ChannelPublisher::pair();
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let handle = spawn_thread(
            tx,
            rx_cmd,
            DcCalibrationPanel::new(4, Some(publisher)),
            ManualSource::new(Vec::new()),
        );

        tx_cmd.send(PanelCommand::MeasuredValues(vec![2.0, 2.0])).unwrap();
        tx_cmd
            .send(PanelCommand::SetActual { channel: 1, value: 1.9 })
            .unwrap();
        tx_cmd.send(PanelCommand::Calculate).unwrap();
        tx_cmd.send(PanelCommand::SendCalibration).unwrap();
        tx_cmd.send(PanelCommand::Reset).unwrap();
        tx_cmd.send(PanelCommand::Close).unwrap();

        let messages = collect_until_closed(&rx);
        handle.join().unwrap();

        assert_eq!(messages.last(), Some(&PanelMessage::Closed));
        assert!(messages.contains(&PanelMessage::CalibrationSent(
            "$DC_CalibratedData:0.95,1.0,1.0,1.0#".to_owned()
        )));
        assert!(messages.contains(&PanelMessage::ResetSent));

        let published: Vec<String> = rx_pub.try_iter().map(|p| p.payload).collect();
        assert_eq!(
            published,
            vec![
                "$DC_CalibratedData:0.95,1.0,1.0,1.0#".to_owned(),
                "$ResetCalibrationData#".to_owned(),
            ]
        );
    }

    #[test]
    fn failures_are_reported_not_fatal() {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let handle = spawn_thread(
            tx,
            rx_cmd,
            DcCalibrationPanel::<ChannelPublisher>::new(2, None),
            ManualSource::new(Vec::new()),
        );

        tx_cmd
            .send(PanelCommand::SetActual { channel: 9, value: 1.0 })
            .unwrap();
        tx_cmd.send(PanelCommand::SendCalibration).unwrap();
        tx_cmd.send(PanelCommand::RequestTable).unwrap();
        drop(tx_cmd);

        let messages = collect_until_closed(&rx);
        handle.join().unwrap();

        assert!(messages.contains(&PanelMessage::Failed {
            action: PanelAction::SetActual,
            error: CalibrationError::ChannelOutOfRange { index: 9, count: 2 },
        }));
        assert!(messages.contains(&PanelMessage::Failed {
            action: PanelAction::SendCalibration,
            error: CalibrationError::PublisherUnavailable,
        }));
        assert!(messages
            .iter()
            .any(|m| matches!(m, PanelMessage::Table(rows) if rows.len() == 2)));
        assert_eq!(messages.last(), Some(&PanelMessage::Closed));
    }

    #[test]
    fn streaming_feeds_measurements() {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let handle = spawn_thread(
            tx,
            rx_cmd,
            DcCalibrationPanel::<ChannelPublisher>::new(2, None),
            ManualSource::new(vec![vec![1.5, 2.5]]),
        );

        tx_cmd.send(PanelCommand::StartStream).unwrap();
        let row = loop {
            match rx.recv_timeout(WAIT).unwrap() {
                PanelMessage::Table(rows) => break rows,
                _ => continue,
            }
        };
        assert_eq!(row[0].measured, "1.500");
        assert_eq!(row[0].actual, 1.5);
        assert_eq!(row[1].label, "Channel 2");
        assert_eq!(row[1].ratio, "1.000");

        tx_cmd.send(PanelCommand::Close).unwrap();
        let rest = collect_until_closed(&rx);
        handle.join().unwrap();
        assert_eq!(rest.last(), Some(&PanelMessage::Closed));
    }
}
