// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! envsim - Environmental Sensor Fleet Emulator
//!
//! Publishes plausible air-quality, particulate and differential-pressure
//! telemetry for a fleet of simulated devices, so ingestion and analytics
//! pipelines can be exercised without hardware:
//! - Bounded random walks for every physical quantity
//! - IAQ/VOC coupling, CO2 excursions and persistent particulate bursts
//! - Fixed-cadence publishing with drift-corrected sleeps
//! - Retained online/offline status around the whole run
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    PublishScheduler                      │
//! │   Starting → Running ──(cancel)──→ Stopping → Stopped    │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐   ┌─────────────────┐               │
//! │  │ DeviceSimulator │ … │ DeviceSimulator │               │
//! │  │  walks+coupling │   │  walks+coupling │               │
//! │  └────────┬────────┘   └────────┬────────┘               │
//! │           └──── tagged payloads ┘                        │
//! │                      ↓                                   │
//! │      TopicNamespace → JSON → Publisher (MQTT)            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Topics: `iot/{site}/{room}/{device}/telemetry/bme688`,
//! `.../telemetry/sps30`, `.../telemetry/dp/{channel}` and the retained
//! `.../status`.

pub mod core;
pub mod sensors;
pub mod streaming;
pub mod config;

// Re-exports for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{PublishScheduler, PublishStats, SchedulerState};
pub use sensors::{BoundedRandomWalk, DeviceProfile, DeviceSimulator, EventPolicy, Payload};
pub use streaming::{MqttPublisher, PublishError, Publisher, QosLevel, TopicNamespace};

/// envsim version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
