// src/main.rs
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{channel, Sender};
use std::thread;

use anyhow::{bail, Context, Result};
use dc_calibration::engine;
use dc_calibration::types::{PanelCommand, PanelMessage};
use dc_calibration::{
    BrokerAddressConfig, BrokerEndpoint, ChannelPublisher, DcCalibrationPanel, SettingsError,
    SimulatedSource, DEFAULT_CHANNEL_COUNT,
};

const HELP: &str = "commands: measured <v...> | actual <ch> <v> | calc | send | reset | \
                    values | start | stop | broker <host> <port> | quit";

fn main() -> Result<()> {
    env_logger::init();

    let channel_count = match std::env::args().nth(1) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("channel count must be a number, got {raw:?}"))?,
        None => DEFAULT_CHANNEL_COUNT,
    };

    let (mut broker, endpoint) = open_broker(BrokerAddressConfig::user_default());
    if endpoint.is_configured() {
        println!("broker: {}:{}", endpoint.host, endpoint.port);
    } else {
        println!("broker not configured (use `broker <host> <port>`)");
    }
    if let Some(config) = broker.as_mut() {
        let saved = config.subscribe();
        thread::spawn(move || {
            for ep in saved {
                println!("broker settings updated: {}:{}", ep.host, ep.port);
            }
        });
    }

    // Stand-in for the MQTT client: print what would go on the wire.
    let (publisher, outbound) = ChannelPublisher::pair();
    thread::spawn(move || {
        for publication in outbound {
            println!("-> [{}] {}", publication.topic, publication.payload);
        }
    });

    let (tx, rx) = channel();
    let (tx_cmd, rx_cmd) = channel();
    let worker = engine::spawn_thread(
        tx,
        rx_cmd,
        DcCalibrationPanel::new(channel_count, Some(publisher)),
        SimulatedSource::with_channels(channel_count),
    );
    let printer = thread::spawn(move || {
        for msg in rx {
            print_message(&msg);
            if msg == PanelMessage::Closed {
                break;
            }
        }
    });

    println!("{HELP}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match run_line(line.trim(), &tx_cmd, broker.as_mut()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("error: {e:#}"),
        }
        io::stdout().flush().ok();
    }

    tx_cmd.send(PanelCommand::Close).ok();
    worker.join().ok();
    printer.join().ok();
    Ok(())
}

/// A missing settings location is not fatal: the console runs with the default
/// endpoint and the `broker` command reports why it cannot save.
fn open_broker(
    opened: Result<BrokerAddressConfig, SettingsError>,
) -> (Option<BrokerAddressConfig>, BrokerEndpoint) {
    match opened {
        Ok(config) => {
            let endpoint = config.load();
            (Some(config), endpoint)
        }
        Err(e) => {
            log::warn!("broker settings unavailable, using defaults: {e}");
            (None, BrokerEndpoint::default())
        }
    }
}

/// Returns `false` when the operator asked to quit.
fn run_line(
    line: &str,
    tx_cmd: &Sender<PanelCommand>,
    broker: Option<&mut BrokerAddressConfig>,
) -> Result<bool> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(true);
    };
    let args: Vec<&str> = words.collect();
    let command = match cmd {
        "measured" => {
            let values = args
                .iter()
                .map(|v| v.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .context("measured values must be numbers")?;
            PanelCommand::MeasuredValues(values)
        }
        "actual" => {
            let [channel, value] = args[..] else {
                bail!("usage: actual <channel> <value>");
            };
            PanelCommand::SetActual {
                channel: channel.parse().context("bad channel")?,
                value: value.parse().context("bad value")?,
            }
        }
        "calc" => PanelCommand::Calculate,
        "send" => PanelCommand::SendCalibration,
        "reset" => PanelCommand::Reset,
        "values" => PanelCommand::RequestTable,
        "start" => PanelCommand::StartStream,
        "stop" => PanelCommand::StopStream,
        "broker" => {
            let [host, port] = args[..] else {
                bail!("usage: broker <host> <port>");
            };
            let Some(broker) = broker else {
                bail!("no settings location (home directory not found), broker settings not saved");
            };
            broker.submit(host, port)?;
            return Ok(true);
        }
        "quit" | "exit" => return Ok(false),
        "help" => {
            println!("{HELP}");
            return Ok(true);
        }
        other => bail!("unknown command {other:?}"),
    };
    tx_cmd
        .send(command)
        .context("calibration engine has stopped")?;
    Ok(true)
}

fn print_message(msg: &PanelMessage) {
    match msg {
        PanelMessage::Log(text) => println!("> {text}"),
        PanelMessage::StreamStatus(on) => {
            println!("> stream {}", if *on { "started" } else { "stopped" })
        }
        PanelMessage::Table(rows) => {
            println!(
                "{:<12}{:>16}{:>16}{:>20}",
                "Channel", "Measured DC (V)", "Actual DC (V)", "Calibration Factor"
            );
            for row in rows {
                println!(
                    "{:<12}{:>16}{:>16.3}{:>20}",
                    row.label, row.measured, row.actual, row.ratio
                );
            }
        }
        PanelMessage::Ratios(ratios) => println!("> ratios: {ratios:?}"),
        PanelMessage::CalibrationSent(_) => println!("> Calibration ratios sent successfully!"),
        PanelMessage::ResetSent => println!("> Calibration reset command sent successfully!"),
        PanelMessage::Failed { action, error } => println!("> {action:?} failed: {error}"),
        PanelMessage::Closed => println!("> closed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_calibration::SettingsStore;
    use std::sync::mpsc::TryRecvError;

    #[test]
    fn missing_home_dir_falls_back_to_default_endpoint() {
        let (broker, endpoint) = open_broker(Err(SettingsError::NoHomeDir));
        assert!(broker.is_none());
        assert_eq!(endpoint, BrokerEndpoint::default());
        assert!(!endpoint.is_configured());
    }

    #[test]
    fn existing_store_is_loaded() {
        let path = std::env::temp_dir()
            .join(format!("dccal-{}-console", std::process::id()))
            .join("mqtt_settings.json");
        let config = BrokerAddressConfig::new(SettingsStore::at(&path));
        let (broker, endpoint) = open_broker(Ok(config));
        assert!(broker.is_some());
        assert_eq!(endpoint, BrokerEndpoint::default());
    }

    #[test]
    fn broker_command_without_settings_location_reports_error() {
        let (tx_cmd, rx_cmd) = channel();
        let err = run_line("broker 10.0.0.1 1883", &tx_cmd, None).unwrap_err();
        assert!(err.to_string().contains("no settings location"));
        assert!(matches!(rx_cmd.try_recv(), Err(TryRecvError::Empty)));

        // The console keeps accepting commands afterwards.
        assert!(run_line("calc", &tx_cmd, None).unwrap());
        assert!(matches!(rx_cmd.try_recv(), Ok(PanelCommand::Calculate)));
    }

    #[test]
    fn broker_usage_is_checked_before_settings_location() {
        let (tx_cmd, _rx_cmd) = channel();
        let err = run_line("broker 10.0.0.1", &tx_cmd, None).unwrap_err();
        assert!(err.to_string().starts_with("usage: broker"));
    }
}
