// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::sensors::{ChannelId, DEFAULT_FIRMWARE};
use crate::streaming::QosLevel;

/// Precondition violations caught before the scheduler starts
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no devices configured")]
    NoDevices,

    #[error("invalid {field} '{value}': must be non-empty and free of '/', '+', '#'")]
    InvalidName { field: &'static str, value: String },

    #[error("device '{0}' configured more than once")]
    DuplicateDevice(String),

    #[error("differential-pressure channel {0} configured more than once")]
    DuplicateChannel(ChannelId),

    #[error("interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),

    #[error("QoS must be 0 or 1, got {0}")]
    InvalidQos(u8),

    #[error("invalid entry '{value}' in {field}")]
    InvalidList { field: &'static str, value: String },
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Broker connection
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Simulated fleet
    #[serde(default)]
    pub emulator: EmulatorConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.emulator.validate()
    }
}

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub username: Option<String>,
    pub password: Option<String>,
    pub qos: QosLevel,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            client_id: "emulator".to_string(),
            keep_alive_secs: 30,
            username: None,
            password: None,
            qos: QosLevel::AtMostOnce,
        }
    }
}

/// Fleet layout and cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub site: String,
    pub room: String,

    /// One simulated device per name
    pub devices: Vec<String>,

    /// Differential-pressure channels; the first is the HEPA stage
    pub dp_channels: Vec<ChannelId>,

    /// Seconds between rounds
    pub interval_secs: f64,

    /// Firmware string reported in status payloads
    pub firmware: String,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            site: "home1".to_string(),
            room: "lab".to_string(),
            devices: vec!["pico2w-01".to_string()],
            dp_channels: vec![1, 2],
            interval_secs: 5.0,
            firmware: DEFAULT_FIRMWARE.to_string(),
        }
    }
}

impl EmulatorConfig {
    /// Round interval. Only meaningful after [`validate`](Self::validate).
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs).unwrap_or(Duration::ZERO)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name("site", &self.site)?;
        check_name("room", &self.room)?;

        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        let mut seen = HashSet::new();
        for device in &self.devices {
            check_name("device", device)?;
            if !seen.insert(device.as_str()) {
                return Err(ConfigError::DuplicateDevice(device.clone()));
            }
        }

        let mut channels = HashSet::new();
        for &channel in &self.dp_channels {
            if !channels.insert(channel) {
                return Err(ConfigError::DuplicateChannel(channel));
            }
        }

        if !self.interval_secs.is_finite() || self.interval_secs <= 0.0 {
            return Err(ConfigError::InvalidInterval(self.interval_secs));
        }
        if self.interval().is_zero() {
            return Err(ConfigError::InvalidInterval(self.interval_secs));
        }

        Ok(())
    }
}

fn check_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value.contains(['/', '+', '#']) {
        return Err(ConfigError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated list of channel numbers.
pub fn parse_channel_list(raw: &str) -> Result<Vec<ChannelId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ChannelId>().map_err(|_| ConfigError::InvalidList {
                field: "dp-channels",
                value: s.to_string(),
            })
        })
        .collect()
}

/// Map a numeric QoS flag onto the supported levels.
pub fn parse_qos(raw: u8) -> Result<QosLevel, ConfigError> {
    QosLevel::try_from(raw).map_err(|_| ConfigError::InvalidQos(raw))
}
