// src/broker/mod.rs
pub mod config;
pub mod settings;

pub use config::BrokerAddressConfig;
pub use settings::{BrokerEndpoint, SettingsStore, DEFAULT_PORT};
