use std::sync::mpsc::{channel, Receiver, Sender};

use super::settings::{BrokerEndpoint, SettingsStore};
use crate::error::{BrokerError, SettingsError, ValidationError};

/// Backing logic of the "MQTT Broker Settings" dialog.
pub struct BrokerAddressConfig {
    store: SettingsStore,
    subscribers: Vec<Sender<BrokerEndpoint>>,
}

impl BrokerAddressConfig {
    pub fn new(store: SettingsStore) -> Self {
        Self {
            store,
            subscribers: Vec::new(),
        }
    }

    /// Uses `<home>/.sarayu/mqtt_settings.json`.
    pub fn user_default() -> Result<Self, SettingsError> {
        SettingsStore::user_default().map(Self::new)
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn validate(host: &str, raw_port: &str) -> Result<BrokerEndpoint, ValidationError> {
        BrokerEndpoint::validate(host, raw_port)
    }

    /// Never fails; anything unreadable yields `{"", 1883}`.
    pub fn load(&self) -> BrokerEndpoint {
        self.store.load_or_default()
    }

    /// Persists the endpoint and tells every subscriber about it.
    pub fn save(&mut self, endpoint: &BrokerEndpoint) -> Result<(), SettingsError> {
        if let Err(e) = self.store.save(endpoint) {
            log::error!("Failed to save settings: {e}");
            return Err(e);
        }
        log::info!(
            "broker settings saved to {}: {}:{}",
            self.store.path().display(),
            endpoint.host,
            endpoint.port
        );
        self.notify(endpoint);
        Ok(())
    }

    /// Validate, then save. Nothing is written when validation fails.
    pub fn submit(&mut self, host: &str, raw_port: &str) -> Result<BrokerEndpoint, BrokerError> {
        let endpoint = Self::validate(host, raw_port)?;
        self.save(&endpoint)?;
        Ok(endpoint)
    }

    /// Registers an observer for successful saves.
    pub fn subscribe(&mut self) -> Receiver<BrokerEndpoint> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, endpoint: &BrokerEndpoint) {
        self.subscribers
            .retain(|tx| tx.send(endpoint.clone()).is_ok());
    }
}
