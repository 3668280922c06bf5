use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::{SettingsError, ValidationError};

pub const DEFAULT_PORT: u16 = 1883;
const SETTINGS_DIR: &str = ".sarayu";
const SETTINGS_FILE: &str = "mqtt_settings.json";

/// Network address of the publish/subscribe broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    /// Builds an endpoint from the raw text of the host and port fields.
    pub fn validate(host: &str, raw_port: &str) -> Result<Self, ValidationError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        let raw_port = raw_port.trim();
        let port = raw_port
            .parse::<u16>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ValidationError::InvalidPort(raw_port.to_owned()))?;
        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }

    /// False for the placeholder endpoint returned when nothing was saved yet.
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }
}

impl Default for BrokerEndpoint {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
        }
    }
}

/// On-disk shape. Fields are optional so a partial file still loads.
#[derive(Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    broker_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    broker_port: Option<i64>,
}

/// Location of the persisted broker settings.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<home>/.sarayu/mqtt_settings.json`
    pub fn user_default() -> Result<Self, SettingsError> {
        let mut path = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
        path.push(SETTINGS_DIR);
        path.push(SETTINGS_FILE);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, endpoint: &BrokerEndpoint) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SettingsFile {
            broker_host: Some(endpoint.host.clone()),
            broker_port: Some(i64::from(endpoint.port)),
        };
        // Four-space indent, same bytes the dashboard has always written.
        let mut json = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut json, formatter);
        file.serialize(&mut ser)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Strict read; callers that want the dialog's forgiving behaviour use
    /// [`SettingsStore::load_or_default`].
    pub fn try_load(&self) -> Result<BrokerEndpoint, SettingsError> {
        let contents = fs::read_to_string(&self.path)?;
        let file: SettingsFile = serde_json::from_str(&contents)?;
        let port = file
            .broker_port
            .and_then(|p| u16::try_from(p).ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PORT);
        Ok(BrokerEndpoint {
            host: file.broker_host.unwrap_or_default(),
            port,
        })
    }

    pub fn load_or_default(&self) -> BrokerEndpoint {
        match self.try_load() {
            Ok(endpoint) => endpoint,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                BrokerEndpoint::default()
            }
            Err(e) => {
                log::warn!("ignoring broker settings at {}: {e}", self.path.display());
                BrokerEndpoint::default()
            }
        }
    }
}
